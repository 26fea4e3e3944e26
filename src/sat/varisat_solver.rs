//! SAT solver integration using varisat

use super::cnf::Clause;
use super::solver::{SolverSolution, SolverStatistics};
use crate::error::{Result, TheoryError};
use std::time::Instant;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver};

const ENGINE: &str = "varisat";

/// SAT solver wrapper for varisat
pub struct VarisatSolver {
    solver: Solver<'static>,
    variable_count: usize,
    clause_count: usize,
}

impl VarisatSolver {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
        }
    }

    /// Add clauses to the solver as one formula
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(&self.to_lits(clause)?);
        }
        self.solver.add_formula(&formula);
        self.clause_count += clauses.len();
        Ok(())
    }

    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        let lits = self.to_lits(clause)?;
        self.solver.add_clause(&lits);
        self.clause_count += 1;
        Ok(())
    }

    fn to_lits(&mut self, clause: &Clause) -> Result<Vec<Lit>> {
        if clause.is_empty() {
            return Err(TheoryError::delegate(ENGINE, "cannot add an empty clause"));
        }

        Ok(clause
            .literals
            .iter()
            .map(|&literal| {
                self.variable_count = self.variable_count.max(literal.unsigned_abs() as usize);
                Lit::from_dimacs(literal as isize)
            })
            .collect())
    }

    /// Solve and return a model, or `None` when unsatisfiable
    pub fn solve(&mut self) -> Result<Option<SolverSolution>> {
        let start_time = Instant::now();

        let satisfiable = self
            .solver
            .solve()
            .map_err(|e| TheoryError::delegate(ENGINE, e.to_string()))?;
        if !satisfiable {
            return Ok(None);
        }

        let model = self
            .solver
            .model()
            .ok_or_else(|| TheoryError::delegate(ENGINE, "satisfiable but no model available"))?;

        let assignment = model
            .into_iter()
            .map(|lit| (lit.var().to_dimacs() as i32, lit.is_positive()))
            .collect();

        Ok(Some(SolverSolution {
            assignment,
            solve_time: start_time.elapsed(),
        }))
    }

    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_satisfiable() {
        let mut solver = VarisatSolver::new();
        solver
            .add_clauses(&[Clause::new(vec![1, 2]), Clause::new(vec![-1, 2])])
            .unwrap();

        let solution = solver.solve().unwrap().unwrap();
        assert!(solution.value(2));
        assert_eq!(solver.clause_count(), 2);
    }

    #[test]
    fn test_unsatisfiable() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&Clause::unit(1)).unwrap();
        solver.add_clause(&Clause::unit(-1)).unwrap();

        assert!(solver.solve().unwrap().is_none());
    }

    #[test]
    fn test_incremental_blocking() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&Clause::unit(1)).unwrap();
        assert!(solver.solve().unwrap().is_some());

        solver.add_clause(&Clause::unit(-1)).unwrap();
        assert!(solver.solve().unwrap().is_none());
    }

    #[test]
    fn test_empty_clause_error() {
        let mut solver = VarisatSolver::new();
        assert!(solver.add_clause(&Clause::new(vec![])).is_err());
    }
}
