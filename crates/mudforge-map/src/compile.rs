//! Grid plus legend to room graph.

use std::collections::HashMap;

use mudforge_world::{Direction, RoomGraph, RoomGraphBuilder, RoomId};

use crate::error::MapError;
use crate::grid::{Cell, TextMap};
use crate::legend::Legend;

/// Build a validated [`RoomGraph`] from `map`.
///
/// Each room cell becomes a room. A connector between two rooms becomes a
/// paired exit, east/west for `-` and south/north for `|`. Connectors that
/// lead nowhere are skipped, or rejected when the legend is strict.
pub fn compile(map: &TextMap, legend: &Legend) -> Result<RoomGraph, MapError> {
    let mut builder = RoomGraphBuilder::new();
    let mut at: HashMap<(usize, usize), RoomId> = HashMap::new();
    let mut by_symbol: HashMap<char, Vec<RoomId>> = HashMap::new();

    for (x, y, symbol) in map.rooms() {
        let (name, description) = legend.room_for(symbol);
        let id = builder.add_room(name, description);
        at.insert((x, y), id);
        by_symbol.entry(symbol).or_default().push(id);
    }
    if at.is_empty() {
        return Err(MapError::NoRooms);
    }

    for (x, y, cell) in map.cells() {
        let (toward, back) = match cell {
            Cell::Horizontal => (Direction::East, Direction::West),
            Cell::Vertical => (Direction::South, Direction::North),
            Cell::Room(_) => {
                for direction in [Direction::East, Direction::South] {
                    let Ok(there) = map.neighbor(x, y, direction) else {
                        continue;
                    };
                    if let (Some(&from), Some(&to)) = (at.get(&(x, y)), at.get(&there)) {
                        builder.connect_direction(from, direction, to)?;
                    }
                }
                continue;
            }
            Cell::Empty => continue,
        };
        if legend.strict && !joins_two_rooms(map, x, y, toward, back) {
            return Err(MapError::DanglingConnector {
                line: y + 1,
                column: x + 1,
                symbol: if cell == Cell::Horizontal { '-' } else { '|' },
            });
        }
    }

    let unique = |symbol: char| -> Result<RoomId, MapError> {
        match by_symbol.get(&symbol).map(Vec::as_slice) {
            None | Some([]) => Err(MapError::UnknownSymbol(symbol)),
            Some([id]) => Ok(*id),
            Some(_) => Err(MapError::AmbiguousSymbol(symbol)),
        }
    };

    for link in &legend.links {
        builder.connect_direction(unique(link.from)?, link.direction, unique(link.to)?)?;
    }
    if let Some(symbol) = legend.start {
        builder.set_start(unique(symbol)?)?;
    }

    let graph = builder.build()?;
    tracing::debug!(rooms = graph.len(), links = legend.links.len(), "map compiled");
    Ok(graph)
}

/// Whether the connector at `(x, y)` has a room on both sides.
fn joins_two_rooms(map: &TextMap, x: usize, y: usize, toward: Direction, back: Direction) -> bool {
    let room_beside = |direction: Direction| {
        let (dx, dy): (isize, isize) = match direction {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
            _ => (0, -1),
        };
        match x.checked_add_signed(dx).zip(y.checked_add_signed(dy)) {
            Some((nx, ny)) => matches!(map.cell(nx, ny), Cell::Room(_)),
            None => false,
        }
    };
    room_beside(toward) && room_beside(back)
}
