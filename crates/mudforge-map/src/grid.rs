//! The text grid.
//!
//! ```text
//! A-B
//! | |
//! C D
//! ```
//!
//! Any non-blank character other than `-` and `|` is a room. `-` joins the
//! rooms to its left and right, `|` the rooms above and below. Blank cells
//! are empty.

use std::path::Path;

use mudforge_world::Direction;

use crate::error::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Room(char),
    /// `-`
    Horizontal,
    /// `|`
    Vertical,
}

impl Cell {
    fn from_char(c: char) -> Self {
        match c {
            '-' => Self::Horizontal,
            '|' => Self::Vertical,
            c if c.is_whitespace() => Self::Empty,
            c => Self::Room(c),
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Room(c) => c,
            Self::Horizontal => '-',
            Self::Vertical => '|',
        }
    }
}

/// A parsed map. Coordinates are `(x, y)` with `y` growing southwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMap {
    rows: Vec<Vec<Cell>>,
}

impl TextMap {
    pub fn parse(text: &str) -> Self {
        let rows = text
            .lines()
            .map(|line| line.chars().map(Cell::from_char).collect())
            .collect();
        Self { rows }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells past the end of a row read as empty.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    /// Every room cell as `(x, y, symbol)`, row by row.
    pub fn rooms(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells().filter_map(|(x, y, cell)| match cell {
            Cell::Room(c) => Some((x, y, c)),
            _ => None,
        })
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, cell)| (x, y, *cell))
        })
    }

    /// The room joined to `(x, y)` by a connector in `direction`.
    pub fn neighbor(
        &self,
        x: usize,
        y: usize,
        direction: Direction,
    ) -> Result<(usize, usize), MapError> {
        let missing = MapError::NoRoomInDirection {
            line: y + 1,
            column: x + 1,
            direction,
        };
        let (dx, dy, connector) = match direction {
            Direction::North => (0, -1, Cell::Vertical),
            Direction::South => (0, 1, Cell::Vertical),
            Direction::East => (1, 0, Cell::Horizontal),
            Direction::West => (-1, 0, Cell::Horizontal),
            Direction::Up | Direction::Down => return Err(missing),
        };

        let step = |n: usize, d: isize| n.checked_add_signed(d);
        let Some((cx, cy)) = step(x, dx).zip(step(y, dy)) else {
            return Err(missing);
        };
        if self.cell(cx, cy) != connector {
            return Err(missing);
        }
        let Some((rx, ry)) = step(cx, dx).zip(step(cy, dy)) else {
            return Err(missing);
        };
        match self.cell(rx, ry) {
            Cell::Room(_) => Ok((rx, ry)),
            _ => Err(missing),
        }
    }
}

impl std::fmt::Display for TextMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: String = row.iter().map(|c| c.as_char()).collect();
            f.write_str(line.trim_end())?;
        }
        Ok(())
    }
}
