//! Witness assignments returned by the delegate engines

use crate::theory::{PropName, Proposition};
use std::collections::BTreeMap;

/// A mapping from proposition to truth value, ordered by proposition id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<Proposition, bool>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prop: Proposition, value: bool) {
        self.values.insert(prop, value);
    }

    pub fn get(&self, prop: &Proposition) -> Option<bool> {
        self.values.get(prop).copied()
    }

    /// Value of `prop`, treating unassigned propositions as false
    pub fn value(&self, prop: &Proposition) -> bool {
        self.get(prop).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Proposition, &bool)> {
        self.values.iter()
    }

    pub fn true_propositions(&self) -> impl Iterator<Item = Proposition> + '_ {
        self.values.iter().filter(|(_, v)| **v).map(|(p, _)| *p)
    }

    /// True propositions grouped by semantic name
    pub fn by_name(&self) -> BTreeMap<PropName, Vec<Proposition>> {
        let mut groups: BTreeMap<PropName, Vec<Proposition>> = BTreeMap::new();
        for prop in self.true_propositions() {
            groups.entry(prop.name()).or_default().push(prop);
        }
        groups
    }
}

impl FromIterator<(Proposition, bool)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (Proposition, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
