//! The theory container and its queries
//!
//! An [`Encoding`] is a list of constraint formulas read as one conjunction.
//! Every query conjoins the list (plus any transient extra literals) and hands
//! the result to a delegate engine.

use super::Proposition;
use crate::error::{Result, TheoryError};
use crate::logic::{Assignment, Formula};
use crate::sat::{CdclBackend, ModelCounter, Models, SatBackend};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

pub struct Encoding {
    constraints: Vec<Formula>,
    sat: Box<dyn SatBackend>,
    counter: Box<dyn ModelCounter>,
}

impl Encoding {
    pub fn new(sat: Box<dyn SatBackend>, counter: Box<dyn ModelCounter>) -> Self {
        Self {
            constraints: Vec::new(),
            sat,
            counter,
        }
    }

    /// An encoding that uses one CDCL backend for every query
    pub fn with_backend(backend: CdclBackend) -> Self {
        Self::new(Box::new(backend), Box::new(backend))
    }

    pub fn add_constraint(&mut self, constraint: Formula) {
        self.constraints.push(constraint);
    }

    pub fn extend<I: IntoIterator<Item = Formula>>(&mut self, constraints: I) {
        self.constraints.extend(constraints);
    }

    pub fn constraints(&self) -> &[Formula] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The whole theory, conjoined with `extra`; the stored list is untouched
    fn conjoin(&self, extra: &[Formula]) -> Formula {
        Formula::and(self.constraints.iter().chain(extra).cloned())
    }

    pub fn is_satisfiable(&self) -> Result<bool> {
        let satisfiable = self.sat.solve(&self.conjoin(&[]))?.is_some();
        info!(event = "satisfiability", satisfiable);
        Ok(satisfiable)
    }

    /// One witness assignment over every referenced proposition
    pub fn solve(&self) -> Result<Assignment> {
        self.sat.solve(&self.conjoin(&[]))?.ok_or(TheoryError::UnsatisfiableTheory)
    }

    /// Exact number of models of the theory together with the `extra` literals.
    ///
    /// Every extra literal must be over a proposition some constraint already
    /// mentions, so all counts range over the same variables. The counter is
    /// only consulted once the SAT backend finds a witness.
    pub fn count_solutions(&self, extra: &[Formula]) -> Result<u128> {
        self.check_literals(extra)?;
        let formula = self.conjoin(extra);
        if self.sat.solve(&formula)?.is_none() {
            debug!(event = "count_skipped", extra = extra.len());
            return Ok(0);
        }

        let count = self.counter.count(&formula)?;
        info!(event = "model_count", extra = extra.len(), count = %count);
        Ok(count)
    }

    /// Every model of the theory, lazily
    pub fn models(&self) -> Result<Models> {
        self.counter.models(&self.conjoin(&[]))
    }

    /// Fraction of the theory's models in which `literal` holds
    pub fn likelihood(&self, literal: &Formula) -> Result<f64> {
        self.check_literals(std::slice::from_ref(literal))?;
        let total = self.count_solutions(&[])?;
        if total == 0 {
            return Err(TheoryError::DivideByZeroLikelihood);
        }

        let matching = self.count_solutions(std::slice::from_ref(literal))?;
        let likelihood = matching as f64 / total as f64;
        info!(event = "likelihood", matching = %matching, total = %total, likelihood);
        Ok(likelihood)
    }

    fn check_literals(&self, extra: &[Formula]) -> Result<()> {
        if extra.is_empty() {
            return Ok(());
        }

        let known = self.propositions();
        for formula in extra {
            match formula.as_literal() {
                Some((prop, _)) if known.contains(&prop) => {}
                Some((prop, _)) => {
                    return Err(TheoryError::UnknownProposition(format!(
                        "{prop} is not mentioned by the theory"
                    )));
                }
                None => {
                    return Err(TheoryError::UnknownProposition(format!(
                        "expected a literal, got a formula of {} nodes",
                        formula.size()
                    )));
                }
            }
        }
        Ok(())
    }

    /// All propositions referenced by any constraint
    pub fn propositions(&self) -> BTreeSet<Proposition> {
        self.constraints.iter().flat_map(|c| c.propositions()).collect()
    }

    /// Number of distinct formula nodes across all constraints
    pub fn size(&self) -> usize {
        let mut visited = HashSet::new();
        for constraint in &self.constraints {
            constraint.walk(&mut visited, &mut |_| {});
        }
        visited.len()
    }
}

impl std::fmt::Debug for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoding")
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}
