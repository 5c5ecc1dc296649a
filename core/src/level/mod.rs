//! Level Model
//!
//! Rooms, their perimeters and flags, and the room-tagged collidable triangles used by the visibility sampler.

use crate::geometry::*;
use bitflags::bitflags;

mod error;
mod parser;

// Re-export
pub use error::*;
pub use parser::*;

bitflags! {
    /// Room classification flags.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RoomFlags: u8 {
        /// Room lies below ground; camera heights use the subterranean limit.
        const SUBTERRANEAN = 0b01;

        /// Room geometry belongs to a placed instance; ground probes are not restricted to the room's own
        /// triangles.
        const INSTANCE = 0b10;
    }
}

/// A vertex of a room's perimeter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerimeterPoint {
    /// Vertex position.
    pub position: Point3f,

    /// Index of the room reached through the edge starting at this vertex, if any.
    pub connected_room: Option<usize>,
}

impl PerimeterPoint {
    /// Create a new perimeter point.
    ///
    /// * `position`       - Vertex position.
    /// * `connected_room` - Index of the connected room.
    pub fn new(position: Point3f, connected_room: Option<usize>) -> Self {
        Self {
            position,
            connected_room,
        }
    }
}

/// An enclosed play-space cell.
#[derive(Debug, Clone)]
pub struct Room {
    /// 0-based room index. Level files and CPVS bit slots use `index + 1`.
    pub index: usize,

    /// Classification flags.
    pub flags: RoomFlags,

    /// Perimeter vertices.
    pub perimeter: Vec<PerimeterPoint>,

    /// Axis aligned bounds of the perimeter.
    pub bounds: Bounds3f,
}

impl Room {
    /// Create a new room and compute its bounds from the perimeter.
    ///
    /// * `index`     - 0-based room index.
    /// * `flags`     - Classification flags.
    /// * `perimeter` - Perimeter vertices; must not be empty.
    pub fn new(index: usize, flags: RoomFlags, perimeter: Vec<PerimeterPoint>) -> Result<Self, LevelError> {
        let first = perimeter
            .first()
            .ok_or(LevelError::EmptyPerimeter(index + 1))?
            .position;
        let bounds = perimeter
            .iter()
            .fold(Bounds3f::from(first), |b, p| b.union(&p.position));

        Ok(Self {
            index,
            flags,
            perimeter,
            bounds,
        })
    }

    /// Returns the 1-based room id.
    pub fn id(&self) -> usize {
        self.index + 1
    }

    /// Returns true if the room is below ground.
    pub fn is_subterranean(&self) -> bool {
        self.flags.contains(RoomFlags::SUBTERRANEAN)
    }

    /// Returns true if the room belongs to a placed instance.
    pub fn is_instance(&self) -> bool {
        self.flags.contains(RoomFlags::INSTANCE)
    }

    /// Returns the indices of rooms reachable through perimeter edges.
    pub fn connections(&self) -> impl Iterator<Item = usize> + '_ {
        self.perimeter.iter().filter_map(|p| p.connected_room)
    }
}

/// A loaded level.
#[derive(Debug, Clone, Default)]
pub struct Level {
    /// Rooms ordered by index.
    pub rooms: Vec<Room>,

    /// Collidable triangles of all rooms.
    pub triangles: Vec<Triangle>,
}

impl Level {
    /// Create a new level, checking that every perimeter connection and triangle refers to an existing room.
    ///
    /// * `rooms`     - Rooms; `rooms[i].index` must equal `i`.
    /// * `triangles` - Collidable triangles.
    pub fn new(rooms: Vec<Room>, triangles: Vec<Triangle>) -> Result<Self, LevelError> {
        let n = rooms.len();
        for (i, room) in rooms.iter().enumerate() {
            if room.index != i {
                return Err(LevelError::MissingRoom(i + 1));
            }
            if let Some(target) = room.connections().find(|&c| c >= n) {
                return Err(LevelError::UnknownConnection {
                    room: room.id(),
                    target: target + 1,
                });
            }
        }
        if let Some(t) = triangles.iter().find(|t| t.room >= n) {
            return Err(LevelError::MissingRoom(t.room + 1));
        }

        Ok(Self { rooms, triangles })
    }

    /// Returns the number of rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns the number of triangles owned by each room.
    pub fn triangle_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.rooms.len()];
        for t in self.triangles.iter() {
            counts[t.room] += 1;
        }
        counts
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
