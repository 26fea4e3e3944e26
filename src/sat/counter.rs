//! Exact model counting and enumeration by repeated solving
//!
//! Each model found is excluded with a blocking clause over the proposition
//! variables, so every projected model is produced exactly once.

use super::cnf::CnfEncoding;
use super::solver_factory::UnifiedSatSolver;
use super::{ModelCounter, Models};
use crate::config::SolverBackend;
use crate::error::{Result, TheoryError};
use crate::logic::{Assignment, Formula};
use tracing::{debug, warn};

/// Lazy, finite stream of the models of one formula
pub struct ModelIter {
    solver: UnifiedSatSolver,
    cnf: CnfEncoding,
    done: bool,
}

impl ModelIter {
    pub fn new(formula: &Formula, backend: SolverBackend) -> Result<Self> {
        let cnf = CnfEncoding::from_formula(formula);
        let mut solver = UnifiedSatSolver::new(backend);
        solver.add_clauses(&cnf.clauses)?;

        debug!(
            event = "cnf_loaded",
            backend = ?backend,
            variables = cnf.variable_count,
            clauses = cnf.clauses.len(),
            projected = cnf.projection.len(),
        );

        Ok(Self {
            solver,
            cnf,
            done: false,
        })
    }

    fn step(&mut self) -> Result<Option<Assignment>> {
        let Some(solution) = self.solver.solve()? else {
            self.done = true;
            return Ok(None);
        };

        debug!(event = "model_found", solve_us = solution.solve_time.as_micros() as u64);

        let assignment = self.cnf.decode(|var| solution.value(var));
        let blocking = self.cnf.blocking_clause(&assignment);
        if blocking.is_empty() {
            self.done = true;
        } else {
            self.solver.add_clause(&blocking)?;
        }

        Ok(Some(assignment))
    }
}

impl Iterator for ModelIter {
    type Item = Result<Assignment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(model) => model.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Counts models by enumerating them, up to an optional limit
#[derive(Debug, Clone, Copy)]
pub struct EnumeratingCounter {
    backend: SolverBackend,
    enumeration_limit: Option<u64>,
}

impl EnumeratingCounter {
    pub fn new(backend: SolverBackend, enumeration_limit: Option<u64>) -> Self {
        Self {
            backend,
            enumeration_limit,
        }
    }
}

impl ModelCounter for EnumeratingCounter {
    fn count(&self, formula: &Formula) -> Result<u128> {
        let mut count: u128 = 0;
        for model in ModelIter::new(formula, self.backend)? {
            model?;
            count += 1;

            if let Some(limit) = self.enumeration_limit {
                if count > u128::from(limit) {
                    warn!(event = "enumeration_limit_exceeded", limit);
                    return Err(TheoryError::delegate(
                        "enumerator",
                        format!("more than {limit} models; raise solver.enumeration_limit"),
                    ));
                }
            }
        }
        Ok(count)
    }

    fn models(&self, formula: &Formula) -> Result<Models> {
        Ok(Box::new(ModelIter::new(formula, self.backend)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Coord;
    use crate::theory::{PropName, PropositionRegistry};

    fn vars(n: usize) -> Vec<Formula> {
        let mut registry = PropositionRegistry::new(n, 1, 0);
        (0..n)
            .map(|col| Formula::var(registry.get_or_create(PropName::Rail, None, Coord::new(col, 0)).unwrap()))
            .collect()
    }

    #[test]
    fn test_counts_projected_models() {
        let v = vars(3);
        // (a | b) & !c
        let f = Formula::and([Formula::or([v[0].clone(), v[1].clone()]), v[2].negate()]);

        for backend in [SolverBackend::Cadical, SolverBackend::Varisat] {
            let counter = EnumeratingCounter::new(backend, None);
            assert_eq!(counter.count(&f).unwrap(), 3);
        }
    }

    #[test]
    fn test_constants() {
        let counter = EnumeratingCounter::new(SolverBackend::Cadical, None);
        assert_eq!(counter.count(&Formula::tautology()).unwrap(), 1);
        assert_eq!(counter.count(&Formula::contradiction()).unwrap(), 0);
    }

    #[test]
    fn test_models_are_distinct_and_satisfying() {
        let v = vars(2);
        let f = Formula::or(v.clone());
        let counter = EnumeratingCounter::new(SolverBackend::Varisat, None);

        let models: Vec<Assignment> = counter.models(&f).unwrap().map(|m| m.unwrap()).collect();
        assert_eq!(models.len(), 3);
        for (i, model) in models.iter().enumerate() {
            assert!(f.evaluate(model));
            assert!(models[i + 1..].iter().all(|other| other != model));
        }
    }

    #[test]
    fn test_enumeration_limit() {
        let v = vars(3);
        let counter = EnumeratingCounter::new(SolverBackend::Cadical, Some(4));
        // 8 models over three free variables
        let f = Formula::or([v[0].clone(), v[0].negate(), Formula::and(v.clone())]);
        assert!(matches!(
            counter.count(&f),
            Err(TheoryError::DelegateFailure { engine: "enumerator", .. })
        ));
    }
}
