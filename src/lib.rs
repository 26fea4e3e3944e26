//! Cosmic Express theory engine
//!
//! This library compiles a Cosmic Express level (a single rail path from an
//! entrance to an exit, carrying colored aliens to matching houses) into a
//! propositional theory, and answers satisfiability, counting and likelihood
//! queries over it using SAT delegates.

pub mod config;
pub mod error;
pub mod level;
pub mod logic;
pub mod sat;
pub mod theory;
pub mod utils;

pub use config::Settings;
pub use error::{LevelError, Result, TheoryError};
pub use level::{Coord, Direction, LevelDescription};
pub use logic::{Assignment, Formula};
pub use theory::{CosmicExpressTheory, Solution};

/// Main entry point: build the theory of `level` and return one solution
pub fn solve_level(level: LevelDescription, settings: &Settings) -> Result<Solution> {
    let theory = CosmicExpressTheory::new(level, settings)?;
    theory.solve()
}
