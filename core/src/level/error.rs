//! Level Loading Errors

use thiserror::Error;

/// Errors raised while loading a level description.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("unable to read level file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in level description: {0}")]
    Syntax(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("room id 0 is reserved")]
    ReservedRoomId,

    #[error("room {0} is defined more than once")]
    DuplicateRoom(usize),

    #[error("room {0} is missing; room ids must be contiguous starting at 1")]
    MissingRoom(usize),

    #[error("room {room} connects to unknown room {target}")]
    UnknownConnection { room: usize, target: usize },

    #[error("room {0} has an empty perimeter")]
    EmptyPerimeter(usize),
}
