//! Boolean formulas, combinators and assignments

pub mod assignment;
pub mod combinators;
pub mod formula;

pub use assignment::Assignment;
pub use combinators::{and, at_most_one_or_none, equiv, exactly_one, implies, negate, none_of, or};
pub use formula::{Formula, Node};
