//! Level File Parser

use super::*;
use crate::math::Float;
use pest::iterators::Pair;
use pest::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// The `pest` parser generated from the level grammar.
#[derive(Parser)]
#[grammar = "level/level.pest"]
struct LevelGrammar;

/// A room as it appears in the file, before ids are resolved to indices.
struct ParsedRoom {
    flags: RoomFlags,
    perimeter: Vec<(Point3f, Option<usize>)>,
    triangles: Vec<[Point3f; 3]>,
}

impl Level {
    /// Load a level description from a file.
    ///
    /// * `path` - Path to the level file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let level = text.parse::<Self>()?;
        info!(
            "Loaded level '{}': {} rooms, {} triangles",
            path.display(),
            level.rooms.len(),
            level.triangles.len()
        );
        Ok(level)
    }
}

impl FromStr for Level {
    type Err = LevelError;

    /// Parse a level description.
    ///
    /// * `s` - Contents of a level file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_level(s)
    }
}

/// Parse a level description. Room ids in the text are 1-based and must be unique and contiguous; they may
/// appear in any order.
///
/// * `text` - Contents of a level file.
pub fn parse_level(text: &str) -> Result<Level, LevelError> {
    let pairs = LevelGrammar::parse(Rule::level, text).map_err(|e| LevelError::Syntax(e.to_string()))?;

    let mut parsed: BTreeMap<usize, ParsedRoom> = BTreeMap::new();
    for pair in pairs.flat_map(|p| p.into_inner()) {
        match pair.as_rule() {
            Rule::room => {
                let (id, room) = parse_room(pair)?;
                if id == 0 {
                    return Err(LevelError::ReservedRoomId);
                }
                if parsed.insert(id, room).is_some() {
                    return Err(LevelError::DuplicateRoom(id));
                }
            }
            Rule::EOI => (), // Done
            _ => unreachable!(),
        }
    }

    // With unique ids, contiguity means the largest id equals the room count.
    let n = parsed.len();
    if let Some((missing, _)) = (1..=n).zip(parsed.keys()).find(|(expected, id)| expected != *id) {
        return Err(LevelError::MissingRoom(missing));
    }

    let mut rooms = Vec::with_capacity(n);
    let mut triangles = vec![];
    for (id, room) in parsed {
        let index = id - 1;
        let mut perimeter = Vec::with_capacity(room.perimeter.len());
        for (position, connection) in room.perimeter {
            let connected_room = match connection {
                Some(target) if target == 0 || target > n => {
                    return Err(LevelError::UnknownConnection { room: id, target })
                }
                Some(target) => Some(target - 1),
                None => None,
            };
            perimeter.push(PerimeterPoint::new(position, connected_room));
        }
        rooms.push(Room::new(index, room.flags, perimeter)?);
        triangles.extend(room.triangles.into_iter().map(|[a, b, c]| Triangle::new(a, b, c, index)));
    }

    debug!("Parsed {} rooms and {} triangles", rooms.len(), triangles.len());
    Level::new(rooms, triangles)
}

/// Parse a `room` rule and return its id with the room contents.
///
/// * `pair` - The matched `room` rule.
fn parse_room(pair: Pair<Rule>) -> Result<(usize, ParsedRoom), LevelError> {
    let mut id = 0;
    let mut room = ParsedRoom {
        flags: RoomFlags::empty(),
        perimeter: vec![],
        triangles: vec![],
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::integer => id = parse_integer(inner)?,
            Rule::flags => {
                for flag in inner.into_inner() {
                    room.flags |= match flag.as_str() {
                        "subterranean" => RoomFlags::SUBTERRANEAN,
                        "instance" => RoomFlags::INSTANCE,
                        _ => unreachable!(),
                    };
                }
            }
            Rule::perimeter => {
                for point in inner.into_inner() {
                    room.perimeter.push(parse_perimeter_point(point)?);
                }
            }
            Rule::tri => {
                let points = inner.into_inner().map(parse_point).collect::<Result<Vec<_>, _>>()?;
                match points[..] {
                    [a, b, c] => room.triangles.push([a, b, c]),
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(),
        }
    }

    Ok((id, room))
}

/// Parse a `perimeter_point` rule.
///
/// * `pair` - The matched `perimeter_point` rule.
fn parse_perimeter_point(pair: Pair<Rule>) -> Result<(Point3f, Option<usize>), LevelError> {
    let mut position = Point3f::default();
    let mut connection = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::point => position = parse_point(inner)?,
            Rule::connection => {
                for target in inner.into_inner() {
                    connection = Some(parse_integer(target)?);
                }
            }
            _ => unreachable!(),
        }
    }
    Ok((position, connection))
}

/// Parse a `point` rule.
///
/// * `pair` - The matched `point` rule.
fn parse_point(pair: Pair<Rule>) -> Result<Point3f, LevelError> {
    let v = pair.into_inner().map(parse_number).collect::<Result<Vec<_>, _>>()?;
    match v[..] {
        [x, y, z] => Ok(Point3f::new(x, y, z)),
        _ => unreachable!(),
    }
}

/// Parse a `number` rule.
///
/// * `pair` - The matched `number` rule.
fn parse_number(pair: Pair<Rule>) -> Result<Float, LevelError> {
    let s = pair.as_str();
    s.parse::<Float>()
        .map_err(|_| LevelError::InvalidNumber(String::from(s)))
}

/// Parse an `integer` rule.
///
/// * `pair` - The matched `integer` rule.
fn parse_integer(pair: Pair<Rule>) -> Result<usize, LevelError> {
    let s = pair.as_str();
    s.parse::<usize>()
        .map_err(|_| LevelError::InvalidNumber(String::from(s)))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_ROOMS: &str = "
        # Two rooms sharing a doorway.
        room 2 [subterranean] {
            perimeter { (10 0 0) -> 1 (20 0 0) (20 0 10) (10 0 10) }
            tri (10 0 0) (20 0 0) (20 0 10)
        }
        room 1 {
            perimeter { (0, 0, 0) (10, 0, 0) -> 2 (10, 0, 10) (0, 0, 10) }
            tri (0 0 0) (10 0 0) (10 0 10)
            tri (0 0 0) (10 0 10) (0 0 10)
        }
    ";

    #[test]
    fn parses_rooms_in_any_order() {
        let level = parse_level(TWO_ROOMS).unwrap();
        assert_eq!(level.room_count(), 2);
        assert_eq!(level.rooms[0].index, 0);
        assert_eq!(level.rooms[0].connections().collect::<Vec<_>>(), vec![1]);
        assert_eq!(level.rooms[1].connections().collect::<Vec<_>>(), vec![0]);
        assert!(level.rooms[1].is_subterranean());
        assert!(!level.rooms[0].is_subterranean());
        assert_eq!(level.triangle_counts(), vec![2, 1]);
        assert_eq!(level.rooms[1].bounds.p_min, Point3f::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn parses_numbers_in_all_forms() {
        let level = parse_level("room 1 [instance] { perimeter { (-1.5 +2 .25) (3e1 0. -1E-1) } }").unwrap();
        let p = &level.rooms[0].perimeter;
        assert_eq!(p[0].position, Point3f::new(-1.5, 2.0, 0.25));
        assert_eq!(p[1].position, Point3f::new(30.0, 0.0, -0.1));
        assert!(level.rooms[0].is_instance());
    }

    #[test]
    fn empty_file_has_no_rooms() {
        let level = parse_level("# nothing here\n").unwrap();
        assert_eq!(level.room_count(), 0);
    }

    #[test]
    fn duplicate_room_is_rejected() {
        let text = "room 1 { perimeter { (0 0 0) } } room 1 { perimeter { (0 0 0) } }";
        assert!(matches!(parse_level(text), Err(LevelError::DuplicateRoom(1))));
    }

    #[test]
    fn gap_in_room_ids_is_rejected() {
        let text = "room 1 { perimeter { (0 0 0) } } room 3 { perimeter { (0 0 0) } }";
        assert!(matches!(parse_level(text), Err(LevelError::MissingRoom(2))));
    }

    #[test]
    fn room_zero_is_rejected() {
        let text = "room 0 { perimeter { (0 0 0) } }";
        assert!(matches!(parse_level(text), Err(LevelError::ReservedRoomId)));
    }

    #[test]
    fn unknown_connection_is_rejected() {
        let text = "room 1 { perimeter { (0 0 0) -> 4 } }";
        assert!(matches!(
            parse_level(text),
            Err(LevelError::UnknownConnection { room: 1, target: 4 })
        ));
    }

    #[test]
    fn empty_perimeter_is_rejected() {
        let text = "room 1 { tri (0 0 0) (1 0 0) (0 0 1) }";
        assert!(matches!(parse_level(text), Err(LevelError::EmptyPerimeter(1))));
    }

    #[test]
    fn syntax_error_is_reported() {
        assert!(matches!(parse_level("room one {}"), Err(LevelError::Syntax(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_ROOMS.as_bytes()).unwrap();
        let level = Level::load(file.path()).unwrap();
        assert_eq!(level.room_count(), 2);
        assert!(matches!(
            Level::load(file.path().with_extension("missing")),
            Err(LevelError::Io { .. })
        ));
    }
}
