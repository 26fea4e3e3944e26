//! The memoized "comes before" predicate over grid cells
//!
//! `comes_before(a, b)` is a formula that holds when the rail path, whatever
//! it turns out to be, runs from `a` to `b`. Adjacent pairs reduce to the
//! rail-output literal of `a` pointing at `b`; longer pairs are built from an
//! intermediate neighbor of `b`.
//!
//! Before a pair is expanded its memo slot is seeded with `false`, so a
//! re-entrant request for the same pair reads `false` instead of recursing.
//! This bounds the work on any finite grid. It can under-approximate
//! precedence when the only derivation of a pair runs back through that same
//! pair; every term that is produced is still a chain of rail-output literals.

use super::{Descriptor, PropName, PropositionRegistry};
use crate::error::Result;
use crate::level::{Coord, Direction};
use crate::logic::Formula;
use std::collections::HashMap;
use strum::VariantArray;

/// Memo table for one theory instance, keyed by ordered (from, to) pairs
#[derive(Debug)]
pub struct OrderingEngine {
    memo: HashMap<(Coord, Coord), Formula>,
    cols: usize,
    rows: usize,
}

impl OrderingEngine {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            memo: HashMap::new(),
            cols,
            rows,
        }
    }

    /// Formula that holds iff the rail path visits `from` before `to`.
    ///
    /// Requires the rail-output propositions of every in-grid cell to be
    /// registered; a missing one is reported as `UnknownProposition`.
    pub fn comes_before(
        &mut self,
        registry: &PropositionRegistry,
        from: Coord,
        to: Coord,
    ) -> Result<Formula> {
        if from == to || !from.within(self.cols, self.rows) || !to.within(self.cols, self.rows) {
            return Ok(Formula::contradiction());
        }

        if let Some(cached) = self.memo.get(&(from, to)) {
            return Ok(cached.clone());
        }

        if let Some(direction) = Direction::between(from, to) {
            let output = registry.lookup(PropName::RailOut, Some(Descriptor::Direction(direction)), from)?;
            let formula = Formula::var(output);
            self.memo.insert((from, to), formula.clone());
            return Ok(formula);
        }

        // in progress
        self.memo.insert((from, to), Formula::contradiction());

        let mut terms = Vec::new();
        for direction in Direction::VARIANTS {
            let Some(via) = to.step(*direction, self.cols, self.rows) else {
                continue;
            };

            let head = self.comes_before(registry, from, via)?;
            if head.is_false() {
                continue;
            }
            let tail = self.comes_before(registry, via, to)?;
            terms.push(Formula::and([head, tail]));
        }

        let formula = Formula::or(terms).simplify();
        self.memo.insert((from, to), formula.clone());
        Ok(formula)
    }

    /// Number of cached pairs
    pub fn memo_size(&self) -> usize {
        self.memo.len()
    }
}
