//! Level descriptions as handed over by a level reader

use super::grid::{Color, Coord, Direction};
use crate::error::LevelError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::VariantArray;

/// A colored entity (alien or house) placed on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub color: Color,
    pub coord: Coord,
}

/// A pre-placed rail segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailPlacement {
    /// Side the train enters from
    pub input: Direction,
    /// Side the train leaves through
    pub output: Direction,
    pub coord: Coord,
}

/// Everything needed to build a theory for one puzzle.
///
/// Entrances and exits are lists because level readers report what the file
/// contains; [`LevelDescription::validate`] insists on exactly one of each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescription {
    pub rows: usize,
    pub cols: usize,
    pub colors: usize,
    pub entrances: Vec<Coord>,
    pub exits: Vec<Coord>,
    #[serde(default)]
    pub aliens: Vec<Placement>,
    #[serde(default)]
    pub houses: Vec<Placement>,
    #[serde(default)]
    pub obstacles: Vec<Coord>,
    #[serde(default)]
    pub rails: Vec<RailPlacement>,
}

impl LevelDescription {
    /// An empty `cols` x `rows` level with the given entrance and exit
    pub fn new(cols: usize, rows: usize, colors: usize, entrance: Coord, exit: Coord) -> Self {
        Self {
            rows,
            cols,
            colors,
            entrances: vec![entrance],
            exits: vec![exit],
            aliens: Vec::new(),
            houses: Vec::new(),
            obstacles: Vec::new(),
            rails: Vec::new(),
        }
    }

    pub fn with_alien(mut self, color: Color, coord: Coord) -> Self {
        self.aliens.push(Placement { color, coord });
        self
    }

    pub fn with_house(mut self, color: Color, coord: Coord) -> Self {
        self.houses.push(Placement { color, coord });
        self
    }

    pub fn with_obstacle(mut self, coord: Coord) -> Self {
        self.obstacles.push(coord);
        self
    }

    pub fn with_rail(mut self, input: Direction, output: Direction, coord: Coord) -> Self {
        self.rails.push(RailPlacement { input, output, coord });
        self
    }

    /// Check cardinalities, bounds, color ranges and cell exclusivity
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(LevelError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.entrances.len() != 1 {
            return Err(LevelError::EntranceCount(self.entrances.len()));
        }
        if self.exits.len() != 1 {
            return Err(LevelError::ExitCount(self.exits.len()));
        }

        for (what, coord) in self.occupied() {
            if !coord.within(self.cols, self.rows) {
                return Err(LevelError::OutOfBounds {
                    what,
                    coord,
                    cols: self.cols,
                    rows: self.rows,
                });
            }
        }

        let colored = self.aliens.iter().map(|p| ("alien", p))
            .chain(self.houses.iter().map(|p| ("house", p)));
        for (what, placement) in colored {
            if placement.color >= self.colors {
                return Err(LevelError::ColorOutOfRange {
                    what,
                    coord: placement.coord,
                    color: placement.color,
                    color_count: self.colors,
                });
            }
        }

        let mut seen = HashSet::new();
        for (_, coord) in self.occupied() {
            if !seen.insert(coord) {
                return Err(LevelError::Overlap(coord));
            }
        }

        Ok(())
    }

    /// Every entity on the board, tagged with its kind
    pub fn occupied(&self) -> impl Iterator<Item = (&'static str, Coord)> + '_ {
        self.entrances.iter().map(|c| ("entrance", *c))
            .chain(self.exits.iter().map(|c| ("exit", *c)))
            .chain(self.aliens.iter().map(|p| ("alien", p.coord)))
            .chain(self.houses.iter().map(|p| ("house", p.coord)))
            .chain(self.obstacles.iter().map(|c| ("obstacle", *c)))
            .chain(self.rails.iter().map(|r| ("rail", r.coord)))
    }

    /// All grid cells, column-major like the original board layout
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cols).flat_map(move |col| (0..self.rows).map(move |row| Coord::new(col, row)))
    }

    /// In-grid neighbors of `coord`, with the direction that reaches each
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = (Direction, Coord)> + '_ {
        Direction::VARIANTS.iter()
            .filter_map(move |d| coord.step(*d, self.cols, self.rows).map(|n| (*d, n)))
    }

    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        coord.step(direction, self.cols, self.rows)
    }

    /// Whether a rail is placed at `coord`
    pub fn has_rail(&self, coord: Coord) -> bool {
        self.rails.iter().any(|r| r.coord == coord)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.within(self.cols, self.rows)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// The single entrance; only meaningful after [`validate`](Self::validate)
    pub fn entrance(&self) -> Option<Coord> {
        self.entrances.first().copied()
    }

    /// The single exit; only meaningful after [`validate`](Self::validate)
    pub fn exit(&self) -> Option<Coord> {
        self.exits.first().copied()
    }
}
