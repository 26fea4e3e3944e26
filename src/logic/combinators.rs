//! Boolean combinators over sequences of formulas
//!
//! Every operation takes exactly one sequence argument. The conjunction of an
//! empty sequence is `true`, the disjunction of an empty sequence is `false`.

use super::Formula;

pub fn negate(f: &Formula) -> Formula {
    f.negate()
}

pub fn and<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
    Formula::and(fs)
}

pub fn or<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
    Formula::or(fs)
}

/// `!a | b`
pub fn implies(a: &Formula, b: &Formula) -> Formula {
    Formula::or([a.negate(), b.clone()])
}

/// `(a -> b) & (b -> a)`
pub fn equiv(a: &Formula, b: &Formula) -> Formula {
    Formula::and([implies(a, b), implies(b, a)])
}

/// Exactly one formula holds. False on an empty sequence.
pub fn exactly_one<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
    let fs: Vec<Formula> = fs.into_iter().collect();
    let negated: Vec<Formula> = fs.iter().map(Formula::negate).collect();

    Formula::or((0..fs.len()).map(|i| {
        Formula::and(
            std::iter::once(fs[i].clone())
                .chain(negated.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, n)| n.clone())),
        )
    }))
}

/// No formula holds. True on an empty sequence.
pub fn none_of<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
    Formula::and(fs.into_iter().map(|f| f.negate()))
}

/// At most one formula holds
pub fn at_most_one_or_none<I: IntoIterator<Item = Formula>>(fs: I) -> Formula {
    let fs: Vec<Formula> = fs.into_iter().collect();
    Formula::or([exactly_one(fs.iter().cloned()), none_of(fs)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Coord;
    use crate::logic::Assignment;
    use crate::theory::{PropName, Proposition, PropositionRegistry};
    use itertools::Itertools;

    fn vars(n: usize) -> (Vec<Proposition>, Vec<Formula>) {
        let mut registry = PropositionRegistry::new(n, 1, 0);
        let props: Vec<_> = (0..n)
            .map(|col| registry.get_or_create(PropName::Obstacle, None, Coord::new(col, 0)).unwrap())
            .collect();
        let formulas = props.iter().map(|p| Formula::var(*p)).collect();
        (props, formulas)
    }

    /// Every assignment of `props`, as (assignment, number of true props)
    fn all_assignments(props: &[Proposition]) -> Vec<(Assignment, usize)> {
        (0..props.len())
            .map(|_| [false, true])
            .multi_cartesian_product()
            .map(|values| {
                let trues = values.iter().filter(|v| **v).count();
                (props.iter().copied().zip(values).collect(), trues)
            })
            .collect()
    }

    #[test]
    fn test_empty_sequences() {
        assert!(and(Vec::new()).is_true());
        assert!(or(Vec::new()).is_false());
        assert!(none_of(Vec::new()).is_true());
        assert!(exactly_one(Vec::new()).is_false());
        assert!(at_most_one_or_none(Vec::new()).is_true());
    }

    #[test]
    fn test_cardinality_truth_tables() {
        let (props, fs) = vars(3);
        let one = exactly_one(fs.clone());
        let none = none_of(fs.clone());
        let at_most = at_most_one_or_none(fs);

        for (assignment, trues) in all_assignments(&props) {
            assert_eq!(one.evaluate(&assignment), trues == 1);
            assert_eq!(none.evaluate(&assignment), trues == 0);
            assert_eq!(at_most.evaluate(&assignment), trues <= 1);
        }
    }

    #[test]
    fn test_implication_and_equivalence() {
        let (props, fs) = vars(2);
        let imp = implies(&fs[0], &fs[1]);
        let eq = equiv(&fs[0], &fs[1]);

        for (assignment, _) in all_assignments(&props) {
            let a = assignment.value(&props[0]);
            let b = assignment.value(&props[1]);
            assert_eq!(imp.evaluate(&assignment), !a || b);
            assert_eq!(eq.evaluate(&assignment), a == b);
        }
    }

    #[test]
    fn test_negate_constant() {
        assert!(negate(&Formula::contradiction()).is_true());
    }
}
