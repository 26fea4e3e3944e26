//! The Cosmic Express theory: propositions, constraints, ordering and queries

pub mod constraints;
pub mod encoding;
pub mod ordering;
pub mod problem;
pub mod solution;
pub mod variables;

pub use constraints::ConstraintGenerator;
pub use encoding::Encoding;
pub use ordering::OrderingEngine;
pub use problem::{CosmicExpressTheory, TheoryStatistics};
pub use solution::{PathStep, Solution};
pub use variables::{
    Descriptor, DescriptorKind, PropKey, PropName, Proposition, PropositionRegistry, RegistryStatistics,
};
