//! Clause form of a formula for the CDCL delegates
//!
//! Uses a definitional (Tseitin) encoding: every connective node gets an
//! auxiliary variable constrained to be *equivalent* to the node. Auxiliary
//! variables are therefore functionally determined by the proposition
//! variables, and models projected onto the propositions are counted exactly.

use crate::logic::{Assignment, Formula, Node};
use crate::theory::Proposition;
use std::collections::{BTreeMap, HashMap};

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    pub fn unit(literal: i32) -> Self {
        Self { literals: vec![literal] }
    }

    pub fn binary(lit1: i32, lit2: i32) -> Self {
        Self { literals: vec![lit1, lit2] }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// Clauses plus the mapping from propositions to solver variables
#[derive(Debug, Clone)]
pub struct CnfEncoding {
    pub clauses: Vec<Clause>,
    pub variable_count: usize,
    /// Solver variable of each referenced proposition, ordered by proposition
    pub projection: Vec<(Proposition, i32)>,
}

impl CnfEncoding {
    /// Encode `formula` so that the clauses are satisfiable iff the formula is
    pub fn from_formula(formula: &Formula) -> Self {
        let mut builder = TseitinBuilder::default();
        let root = builder.literal(formula);
        builder.clauses.push(Clause::unit(root));

        Self {
            clauses: builder.clauses,
            variable_count: builder.next_var as usize,
            projection: builder.propositions.into_iter().collect(),
        }
    }

    /// Read the propositions back out of a solver model
    pub fn decode<F: Fn(i32) -> bool>(&self, value: F) -> Assignment {
        self.projection.iter().map(|(prop, var)| (*prop, value(*var))).collect()
    }

    /// Clause excluding `assignment` on the projection variables.
    ///
    /// Empty when nothing is projected, in which case there is only one
    /// projected model to begin with.
    pub fn blocking_clause(&self, assignment: &Assignment) -> Clause {
        Clause::new(
            self.projection
                .iter()
                .map(|(prop, var)| if assignment.value(prop) { -var } else { *var })
                .collect(),
        )
    }
}

#[derive(Default)]
struct TseitinBuilder {
    clauses: Vec<Clause>,
    next_var: i32,
    nodes: HashMap<usize, i32>,
    propositions: BTreeMap<Proposition, i32>,
    true_var: Option<i32>,
}

impl TseitinBuilder {
    fn fresh(&mut self) -> i32 {
        self.next_var += 1;
        self.next_var
    }

    /// A variable forced true, standing in for constants
    fn true_literal(&mut self) -> i32 {
        if let Some(var) = self.true_var {
            return var;
        }
        let var = self.fresh();
        self.clauses.push(Clause::unit(var));
        self.true_var = Some(var);
        var
    }

    fn literal(&mut self, formula: &Formula) -> i32 {
        if let Some(lit) = self.nodes.get(&formula.node_id()) {
            return *lit;
        }

        let lit = match formula.node() {
            Node::Const(value) => {
                let t = self.true_literal();
                if *value { t } else { -t }
            }
            Node::Var(prop) => match self.propositions.get(prop) {
                Some(var) => *var,
                None => {
                    let var = self.fresh();
                    self.propositions.insert(*prop, var);
                    var
                }
            },
            Node::Not(inner) => -self.literal(inner),
            Node::And(children) => {
                let lits: Vec<i32> = children.iter().map(|c| self.literal(c)).collect();
                let var = self.fresh();
                // var -> each child
                for lit in &lits {
                    self.clauses.push(Clause::binary(-var, *lit));
                }
                // all children -> var
                let mut clause: Vec<i32> = lits.iter().map(|l| -l).collect();
                clause.push(var);
                self.clauses.push(Clause::new(clause));
                var
            }
            Node::Or(children) => {
                let lits: Vec<i32> = children.iter().map(|c| self.literal(c)).collect();
                let var = self.fresh();
                // each child -> var
                for lit in &lits {
                    self.clauses.push(Clause::binary(-lit, var));
                }
                // var -> some child
                let mut clause = lits;
                clause.push(-var);
                self.clauses.push(Clause::new(clause));
                var
            }
        };

        self.nodes.insert(formula.node_id(), lit);
        lit
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
    fn test_no_empty_clauses() {
        let cnf = CnfEncoding::from_formula(&Formula::contradiction());
        assert!(cnf.clauses.iter().all(|c| !c.is_empty()));
        assert!(cnf.projection.is_empty());
        assert_eq!(cnf.clauses, vec![Clause::unit(1), Clause::unit(-1)]);
    }

    #[test]
    fn test_shared_nodes_encoded_once() {
        let v = vars(2);
        let shared = Formula::and([v[0].clone(), v[1].clone()]);
        let f = Formula::or([shared.clone(), shared.negate()]);

        let cnf = CnfEncoding::from_formula(&f);
        // two propositions, one and-node, one or-node
        assert_eq!(cnf.variable_count, 4);
        assert_eq!(cnf.projection.len(), 2);
    }

    #[test]
    fn test_decode_and_block() {
        let v = vars(2);
        let cnf = CnfEncoding::from_formula(&Formula::or(v.clone()));

        let assignment = cnf.decode(|var| var == cnf.projection[0].1);
        assert!(assignment.value(&cnf.projection[0].0));
        assert!(!assignment.value(&cnf.projection[1].0));

        let blocking = cnf.blocking_clause(&assignment);
        assert_eq!(blocking.literals, vec![-cnf.projection[0].1, cnf.projection[1].1]);
    }
}
