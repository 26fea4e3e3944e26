//! SAT solver integration using CaDiCaL

use super::cnf::Clause;
use crate::error::{Result, TheoryError};
use cadical::Solver;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const ENGINE: &str = "cadical";

/// SAT solver wrapper for CaDiCaL
pub struct CadicalSolver {
    solver: Solver,
    variable_count: usize,
    clause_count: usize,
}

/// One model returned by a CDCL backend
#[derive(Debug, Clone)]
pub struct SolverSolution {
    pub assignment: HashMap<i32, bool>,
    pub solve_time: Duration,
}

impl SolverSolution {
    /// Value of a solver variable; variables the solver never saw read as false
    pub fn value(&self, var: i32) -> bool {
        self.assignment.get(&var).copied().unwrap_or(false)
    }
}

/// Statistics about the clause database
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
}

impl CadicalSolver {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
        }
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            return Err(TheoryError::delegate(ENGINE, "cannot add an empty clause"));
        }

        for &literal in &clause.literals {
            self.variable_count = self.variable_count.max(literal.unsigned_abs() as usize);
        }

        self.solver.add_clause(clause.literals.iter().copied());
        self.clause_count += 1;
        Ok(())
    }

    /// Solve and return a model, or `None` when unsatisfiable
    pub fn solve(&mut self) -> Result<Option<SolverSolution>> {
        let start_time = Instant::now();

        match self.solver.solve() {
            Some(true) => Ok(Some(SolverSolution {
                assignment: self.extract_assignment(),
                solve_time: start_time.elapsed(),
            })),
            Some(false) => Ok(None),
            None => Err(TheoryError::delegate(ENGINE, "solver stopped without a verdict")),
        }
    }

    fn extract_assignment(&self) -> HashMap<i32, bool> {
        let mut assignment = HashMap::new();

        for var in 1..=self.variable_count as i32 {
            if let Some(value) = self.solver.value(var) {
                assignment.insert(var, value);
            }
        }

        assignment
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

impl Default for CadicalSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_creation() {
        let solver = CadicalSolver::new();
        assert_eq!(solver.variable_count(), 0);
        assert_eq!(solver.clause_count(), 0);
    }

    #[test]
    fn test_simple_satisfiable() {
        let mut solver = CadicalSolver::new();

        // x1 ∨ x2, ¬x1 ∨ x2
        solver.add_clause(&Clause::new(vec![1, 2])).unwrap();
        solver.add_clause(&Clause::new(vec![-1, 2])).unwrap();

        let start = Instant::now();
        let solution = solver.solve().unwrap().unwrap();
        assert!(solution.value(2));
        assert!(solution.solve_time <= start.elapsed());
    }

    #[test]
    fn test_unsatisfiable() {
        let mut solver = CadicalSolver::new();
        solver.add_clause(&Clause::unit(1)).unwrap();
        solver.add_clause(&Clause::unit(-1)).unwrap();

        assert!(solver.solve().unwrap().is_none());
    }

    #[test]
    fn test_empty_clause_error() {
        let mut solver = CadicalSolver::new();
        assert!(matches!(
            solver.add_clause(&Clause::new(vec![])),
            Err(TheoryError::DelegateFailure { engine: "cadical", .. })
        ));
    }

    #[test]
    fn test_variable_count_tracking() {
        let mut solver = CadicalSolver::new();

        solver.add_clause(&Clause::new(vec![1, -5, 3])).unwrap();
        assert_eq!(solver.variable_count(), 5);

        solver.add_clause(&Clause::new(vec![2, -7])).unwrap();
        assert_eq!(solver.variable_count(), 7);
        assert_eq!(solver.statistics().clause_count, 2);
    }
}
