//! Immutable, shareable boolean formulas over propositions
//!
//! Formulas are reference-counted DAG nodes. The smart constructors fold
//! constants, flatten nested connectives of the same kind and collapse
//! single-child connectives, so formula growth stays bounded when the same
//! sub-formulas are combined over and over.

use super::Assignment;
use crate::theory::Proposition;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

/// One node of a formula DAG
#[derive(Debug)]
pub enum Node {
    Const(bool),
    Var(Proposition),
    Not(Formula),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

/// A cheaply clonable handle to a formula node
#[derive(Debug, Clone)]
pub struct Formula(Rc<Node>);

impl Formula {
    pub fn constant(value: bool) -> Self {
        Formula(Rc::new(Node::Const(value)))
    }

    pub fn tautology() -> Self {
        Self::constant(true)
    }

    pub fn contradiction() -> Self {
        Self::constant(false)
    }

    pub fn var(prop: Proposition) -> Self {
        Formula(Rc::new(Node::Var(prop)))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Identity of the underlying node, stable while any handle to it lives
    pub fn node_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Formula) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_const(&self) -> Option<bool> {
        match self.node() {
            Node::Const(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_const() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.as_const() == Some(false)
    }

    /// `Some((prop, polarity))` for a variable or a negated variable
    pub fn as_literal(&self) -> Option<(Proposition, bool)> {
        match self.node() {
            Node::Var(p) => Some((*p, true)),
            Node::Not(inner) => match inner.node() {
                Node::Var(p) => Some((*p, false)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn negate(&self) -> Formula {
        match self.node() {
            Node::Const(value) => Formula::constant(!value),
            Node::Not(inner) => inner.clone(),
            _ => Formula(Rc::new(Node::Not(self.clone()))),
        }
    }

    pub fn and<I: IntoIterator<Item = Formula>>(parts: I) -> Formula {
        Self::connective(parts, true)
    }

    pub fn or<I: IntoIterator<Item = Formula>>(parts: I) -> Formula {
        Self::connective(parts, false)
    }

    /// Shallow structural simplification of the top node.
    ///
    /// Re-applies flattening and constant folding, then removes duplicate
    /// children (by node identity or equal literal) and folds complementary
    /// literals (`x & !x`, `x | !x`). Children are assumed already built by
    /// the smart constructors, so the cost is linear in the number of children.
    pub fn simplify(&self) -> Formula {
        let (children, conjunctive) = match self.node() {
            Node::And(children) => (children, true),
            Node::Or(children) => (children, false),
            _ => return self.clone(),
        };

        let mut seen_nodes = HashSet::new();
        let mut seen_literals: HashMap<Proposition, bool> = HashMap::new();
        let mut kept = Vec::with_capacity(children.len());

        for child in Self::flatten(children.iter().cloned(), conjunctive) {
            match child.as_const() {
                Some(value) if value == conjunctive => continue,
                Some(_) => return Formula::constant(!conjunctive),
                None => {}
            }

            if let Some((prop, polarity)) = child.as_literal() {
                match seen_literals.get(&prop) {
                    Some(existing) if *existing == polarity => continue,
                    Some(_) => return Formula::constant(!conjunctive),
                    None => {
                        seen_literals.insert(prop, polarity);
                    }
                }
            } else if !seen_nodes.insert(child.node_id()) {
                continue;
            }

            kept.push(child);
        }

        Self::build(kept, conjunctive)
    }

    fn connective<I: IntoIterator<Item = Formula>>(parts: I, conjunctive: bool) -> Formula {
        let mut kept = Vec::new();
        for part in Self::flatten(parts, conjunctive) {
            match part.as_const() {
                // neutral element
                Some(value) if value == conjunctive => {}
                // absorbing element
                Some(_) => return Formula::constant(!conjunctive),
                None => kept.push(part),
            }
        }
        Self::build(kept, conjunctive)
    }

    fn flatten<I: IntoIterator<Item = Formula>>(parts: I, conjunctive: bool) -> Vec<Formula> {
        let mut out = Vec::new();
        for part in parts {
            match (part.node(), conjunctive) {
                (Node::And(children), true) | (Node::Or(children), false) => {
                    out.extend(children.iter().cloned())
                }
                _ => out.push(part),
            }
        }
        out
    }

    fn build(mut kept: Vec<Formula>, conjunctive: bool) -> Formula {
        match kept.len() {
            0 => Formula::constant(conjunctive),
            1 => kept.pop().unwrap_or_else(|| Formula::constant(conjunctive)),
            _ if conjunctive => Formula(Rc::new(Node::And(kept))),
            _ => Formula(Rc::new(Node::Or(kept))),
        }
    }

    /// Evaluate under an assignment; unassigned propositions read as false
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        let mut memo = HashMap::new();
        self.evaluate_memo(assignment, &mut memo)
    }

    fn evaluate_memo(&self, assignment: &Assignment, memo: &mut HashMap<usize, bool>) -> bool {
        if let Some(value) = memo.get(&self.node_id()) {
            return *value;
        }
        let value = match self.node() {
            Node::Const(value) => *value,
            Node::Var(p) => assignment.value(p),
            Node::Not(inner) => !inner.evaluate_memo(assignment, memo),
            Node::And(children) => children.iter().all(|c| c.evaluate_memo(assignment, memo)),
            Node::Or(children) => children.iter().any(|c| c.evaluate_memo(assignment, memo)),
        };
        memo.insert(self.node_id(), value);
        value
    }

    /// Every proposition referenced by this formula
    pub fn propositions(&self) -> BTreeSet<Proposition> {
        let mut props = BTreeSet::new();
        self.walk(&mut HashSet::new(), &mut |node| {
            if let Node::Var(p) = node {
                props.insert(*p);
            }
        });
        props
    }

    /// Number of distinct nodes in the DAG
    pub fn size(&self) -> usize {
        let mut visited = HashSet::new();
        self.walk(&mut visited, &mut |_| {});
        visited.len()
    }

    /// Visit each distinct node once; `visited` may be shared across formulas
    pub fn walk<F: FnMut(&Node)>(&self, visited: &mut HashSet<usize>, visit: &mut F) {
        let mut stack = vec![self.clone()];
        while let Some(formula) = stack.pop() {
            if !visited.insert(formula.node_id()) {
                continue;
            }
            visit(formula.node());
            match formula.node() {
                Node::Not(inner) => stack.push(inner.clone()),
                Node::And(children) | Node::Or(children) => stack.extend(children.iter().cloned()),
                Node::Const(_) | Node::Var(_) => {}
            }
        }
    }
}

impl From<Proposition> for Formula {
    fn from(prop: Proposition) -> Self {
        Formula::var(prop)
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Formula::constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Coord;
    use crate::theory::{PropName, PropositionRegistry};

    fn props(n: usize) -> Vec<Formula> {
        let mut registry = PropositionRegistry::new(n, 1, 0);
        (0..n)
            .map(|col| Formula::var(registry.get_or_create(PropName::Rail, None, Coord::new(col, 0)).unwrap()))
            .collect()
    }

    #[test]
    fn test_empty_connectives() {
        assert!(Formula::and(Vec::new()).is_true());
        assert!(Formula::or(Vec::new()).is_false());
    }

    #[test]
    fn test_constant_folding() {
        let v = props(1);
        let x = v[0].clone();

        assert!(Formula::and([x.clone(), Formula::contradiction()]).is_false());
        assert!(Formula::or([x.clone(), Formula::tautology()]).is_true());
        assert!(Formula::and([x.clone(), Formula::tautology()]).ptr_eq(&x));
        assert!(Formula::or([Formula::contradiction(), x.clone()]).ptr_eq(&x));
    }

    #[test]
    fn test_double_negation() {
        let x = props(1).remove(0);
        assert!(x.negate().negate().ptr_eq(&x));
        assert!(Formula::tautology().negate().is_false());
    }

    #[test]
    fn test_flattening() {
        let v = props(3);
        let nested = Formula::and([v[0].clone(), Formula::and([v[1].clone(), v[2].clone()])]);
        match nested.node() {
            Node::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_simplify_complementary_literals() {
        let v = props(2);
        let x = v[0].clone();

        assert!(Formula::or([x.clone(), x.negate()]).simplify().is_true());
        assert!(Formula::and([x.clone(), v[1].clone(), x.negate()]).simplify().is_false());

        let deduped = Formula::or([x.clone(), v[1].clone(), x.clone()]).simplify();
        match deduped.node() {
            Node::Or(children) => assert_eq!(children.len(), 2),
            other => panic!("expected disjunction, got {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_and_propositions() {
        let v = props(2);
        let f = Formula::or([Formula::and([v[0].clone(), v[1].negate()]), v[1].clone()]);

        let a = v[0].as_literal().unwrap().0;
        let b = v[1].as_literal().unwrap().0;

        let mut assignment = Assignment::new();
        assignment.insert(a, true);
        assignment.insert(b, false);
        assert!(f.evaluate(&assignment));

        assignment.insert(a, false);
        assert!(!f.evaluate(&assignment));

        assert_eq!(f.propositions().into_iter().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_size_counts_shared_nodes_once() {
        let v = props(2);
        let shared = Formula::and([v[0].clone(), v[1].clone()]);
        let f = Formula::or([shared.clone(), Formula::and([shared.negate(), v[0].clone()])]);
        // or, shared and, v0, v1, not(shared), inner and
        assert_eq!(f.size(), 6);
    }
}
