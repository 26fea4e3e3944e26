//! Grid coordinates and compass directions

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString, VariantArray};

/// Cargo color index, always below the level's color count
pub type Color = usize;

/// A cell on the grid. Row 0 is the bottom row, so North increases `row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub col: usize,
    pub row: usize,
}

impl Coord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Step one cell in `direction`, or `None` when that leaves a `cols` x `rows` grid
    pub fn step(self, direction: Direction, cols: usize, rows: usize) -> Option<Coord> {
        let (dc, dr) = direction.offset();
        let col = self.col.checked_add_signed(dc)?;
        let row = self.row.checked_add_signed(dr)?;
        (col < cols && row < rows).then_some(Coord { col, row })
    }

    /// Whether this coordinate lies inside a `cols` x `rows` grid
    pub fn within(self, cols: usize, rows: usize) -> bool {
        self.col < cols && self.row < rows
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((col, row): (usize, usize)) -> Self {
        Self { col, row }
    }
}

/// The four grid directions. `VARIANTS` lists them clockwise from North.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, VariantArray, Display, EnumString,
)]
pub enum Direction {
    #[strum(serialize = "N", to_string = "North")]
    North,
    #[strum(serialize = "E", to_string = "East")]
    East,
    #[strum(serialize = "S", to_string = "South")]
    South,
    #[strum(serialize = "W", to_string = "West")]
    West,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// (column, row) delta of one step
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Direction of the single step from `from` to `to`, if they are grid-adjacent
    pub fn between(from: Coord, to: Coord) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|d| {
            let (dc, dr) = d.offset();
            from.col.checked_add_signed(dc) == Some(to.col)
                && from.row.checked_add_signed(dr) == Some(to.row)
        })
    }

    /// Single-letter form used in compact literal syntax
    pub fn letter(self) -> char {
        match self {
            Self::North => 'N',
            Self::East => 'E',
            Self::South => 'S',
            Self::West => 'W',
        }
    }
}
