//! Delegate reasoning engines: satisfiability, model counting and enumeration
//!
//! The theory layer only talks to [`SatBackend`] and [`ModelCounter`]. The
//! implementations here convert formulas to clauses and run them through
//! CaDiCaL or varisat.

pub mod cnf;
pub mod counter;
pub mod solver;
pub mod solver_factory;
pub mod varisat_solver;

pub use cnf::{Clause, CnfEncoding};
pub use counter::{EnumeratingCounter, ModelIter};
pub use solver::{CadicalSolver, SolverSolution, SolverStatistics};
pub use solver_factory::UnifiedSatSolver;
pub use varisat_solver::VarisatSolver;

use crate::config::{SolverBackend, SolverConfig};
use crate::error::Result;
use crate::logic::{Assignment, Formula};

/// Lazy, finite, non-restartable sequence of satisfying assignments
pub type Models = Box<dyn Iterator<Item = Result<Assignment>>>;

/// Decides satisfiability and produces one witness
pub trait SatBackend {
    /// `Ok(None)` when the formula is unsatisfiable
    fn solve(&self, formula: &Formula) -> Result<Option<Assignment>>;
}

/// Counts or enumerates the models of a formula, projected onto its propositions
pub trait ModelCounter {
    fn count(&self, formula: &Formula) -> Result<u128>;
    fn models(&self, formula: &Formula) -> Result<Models>;
}

/// CDCL delegate for both traits, backed by the configured solver
#[derive(Debug, Clone, Copy)]
pub struct CdclBackend {
    backend: SolverBackend,
    counter: EnumeratingCounter,
}

impl CdclBackend {
    pub fn new(backend: SolverBackend, enumeration_limit: Option<u64>) -> Self {
        Self {
            backend,
            counter: EnumeratingCounter::new(backend, enumeration_limit),
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.backend, config.enumeration_limit)
    }

    pub fn backend(&self) -> SolverBackend {
        self.backend
    }
}

impl Default for CdclBackend {
    fn default() -> Self {
        Self::new(SolverBackend::default(), None)
    }
}

impl SatBackend for CdclBackend {
    fn solve(&self, formula: &Formula) -> Result<Option<Assignment>> {
        ModelIter::new(formula, self.backend)?.next().transpose()
    }
}

impl ModelCounter for CdclBackend {
    fn count(&self, formula: &Formula) -> Result<u128> {
        self.counter.count(formula)
    }

    fn models(&self, formula: &Formula) -> Result<Models> {
        self.counter.models(formula)
    }
}
