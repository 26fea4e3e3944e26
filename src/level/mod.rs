//! Level descriptions and grid primitives

pub mod grid;
pub mod description;
pub mod io;

pub use grid::{Color, Coord, Direction};
pub use description::{LevelDescription, Placement, RailPlacement};
pub use io::{load_level_from_file, save_level_to_file, create_example_levels};
