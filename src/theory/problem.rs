//! One theory instance per level

use super::{ConstraintGenerator, Encoding, PropKey, Proposition, PropositionRegistry, Solution};
use crate::config::Settings;
use crate::error::{Result, TheoryError};
use crate::level::{Coord, LevelDescription};
use crate::logic::Formula;
use crate::sat::{CdclBackend, ModelCounter, Models, SatBackend};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// The compiled theory of a Cosmic Express level.
///
/// Owns its registry, ordering memo table and constraint set. Nothing here is
/// shared with theories of other levels.
#[derive(Debug)]
pub struct CosmicExpressTheory {
    generator: ConstraintGenerator,
    encoding: Encoding,
    build_time: Duration,
}

impl CosmicExpressTheory {
    /// Build the theory with the delegates named in `settings`
    pub fn new(level: LevelDescription, settings: &Settings) -> Result<Self> {
        Self::with_backend(level, CdclBackend::from_config(&settings.solver))
    }

    pub fn with_backend(level: LevelDescription, backend: CdclBackend) -> Result<Self> {
        Self::with_delegates(level, Box::new(backend), Box::new(backend))
    }

    /// Build the theory with arbitrary delegate engines
    pub fn with_delegates(
        level: LevelDescription,
        sat: Box<dyn SatBackend>,
        counter: Box<dyn ModelCounter>,
    ) -> Result<Self> {
        let start_time = Instant::now();

        let mut generator = ConstraintGenerator::new(level)?;
        let mut encoding = Encoding::new(sat, counter);
        encoding.extend(generator.generate_all_constraints()?);

        let build_time = start_time.elapsed();
        info!(
            event = "theory_built",
            cols = generator.level().cols,
            rows = generator.level().rows,
            propositions = generator.registry().len(),
            constraints = encoding.len(),
            build_ms = build_time.as_millis() as u64,
        );

        Ok(Self {
            generator,
            encoding,
            build_time,
        })
    }

    pub fn level(&self) -> &LevelDescription {
        self.generator.level()
    }

    pub fn registry(&self) -> &PropositionRegistry {
        self.generator.registry()
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn proposition(&self, key: &PropKey) -> Result<Proposition> {
        self.registry().lookup_key(key)
    }

    /// The literal `key` (or its negation) as a formula
    pub fn literal(&self, key: &PropKey, positive: bool) -> Result<Formula> {
        let var = Formula::var(self.proposition(key)?);
        Ok(if positive { var } else { var.negate() })
    }

    /// Parse `[~]name[:descriptor]@col,row` into a literal of this theory
    pub fn parse_literal(&self, text: &str) -> Result<Formula> {
        let text = text.trim();
        let (positive, key) = match text.strip_prefix('~').or_else(|| text.strip_prefix('!')) {
            Some(rest) => (false, rest),
            None => (true, text),
        };
        let key: PropKey = key.parse().map_err(TheoryError::UnknownProposition)?;
        self.literal(&key, positive)
    }

    /// Ordering predicate between two cells of this level
    pub fn comes_before(&mut self, from: Coord, to: Coord) -> Result<Formula> {
        self.generator.comes_before(from, to)
    }

    pub fn is_satisfiable(&self) -> Result<bool> {
        self.encoding.is_satisfiable()
    }

    /// One solution, summarised; `UnsatisfiableTheory` if there is none
    pub fn solve(&self) -> Result<Solution> {
        let assignment = self.encoding.solve()?;
        Ok(Solution::new(self.level(), assignment))
    }

    pub fn count_solutions(&self, extra: &[Formula]) -> Result<u128> {
        self.encoding.count_solutions(extra)
    }

    pub fn models(&self) -> Result<Models> {
        self.encoding.models()
    }

    pub fn likelihood(&self, literal: &Formula) -> Result<f64> {
        self.encoding.likelihood(literal)
    }

    pub fn statistics(&self) -> TheoryStatistics {
        TheoryStatistics {
            propositions: self.registry().len(),
            constraints: self.encoding.len(),
            formula_size: self.encoding.size(),
            ordering_memo: self.generator.ordering().memo_size(),
            build_time: self.build_time,
        }
    }
}

/// Size of a compiled theory
#[derive(Debug, Clone)]
pub struct TheoryStatistics {
    pub propositions: usize,
    pub constraints: usize,
    pub formula_size: usize,
    pub ordering_memo: usize,
    pub build_time: Duration,
}

impl fmt::Display for TheoryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Theory Statistics:")?;
        writeln!(f, "  Propositions: {}", self.propositions)?;
        writeln!(f, "  Constraints: {}", self.constraints)?;
        writeln!(f, "  Formula nodes: {}", self.formula_size)?;
        writeln!(f, "  Ordering memo entries: {}", self.ordering_memo)?;
        writeln!(f, "  Build time: {:.3}s", self.build_time.as_secs_f64())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverBackend;
    use crate::error::LevelError;
    use crate::level::io::example_levels;
    use crate::level::Direction;

    fn level(name: &str) -> LevelDescription {
        example_levels()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| l)
            .unwrap()
    }

    fn theory(level: LevelDescription) -> CosmicExpressTheory {
        CosmicExpressTheory::with_backend(level, CdclBackend::new(SolverBackend::Cadical, Some(1_000))).unwrap()
    }

    #[test]
    fn test_straight_line_has_one_solution() {
        let theory = theory(level("straight"));
        assert!(theory.is_satisfiable().unwrap());
        assert_eq!(theory.count_solutions(&[]).unwrap(), 1);

        let solution = theory.solve().unwrap();
        assert!(solution.is_complete());
        assert_eq!(solution.rail_path().len(), 1);
    }

    #[test]
    fn test_disconnected_level_is_unsatisfiable() {
        let theory = theory(level("blocked"));
        assert!(!theory.is_satisfiable().unwrap());
        assert_eq!(theory.count_solutions(&[]).unwrap(), 0);
        assert!(matches!(theory.solve(), Err(TheoryError::UnsatisfiableTheory)));
        assert!(matches!(
            theory.likelihood(&theory.parse_literal("rail@1,0").unwrap()),
            Err(TheoryError::DivideByZeroLikelihood)
        ));
    }

    #[test]
    fn test_delivery_level() {
        let theory = theory(level("delivery"));
        assert_eq!(theory.count_solutions(&[]).unwrap(), 1);

        let solution = theory.solve().unwrap();
        assert!(solution.is_complete());
        assert_eq!(solution.satisfied_aliens, vec![Coord::new(1, 0)]);
        assert_eq!(solution.satisfied_houses, vec![Coord::new(3, 0)]);
        let cargo: Vec<_> = solution.rail_path().iter().map(|s| s.cargo).collect();
        assert_eq!(cargo, vec![Some(0), Some(0), None]);
    }

    #[test]
    fn test_detour_level_with_varisat() {
        let theory = CosmicExpressTheory::with_backend(
            level("detour"),
            CdclBackend::new(SolverBackend::Varisat, Some(1_000)),
        )
        .unwrap();

        assert_eq!(theory.count_solutions(&[]).unwrap(), 1);
        let solution = theory.solve().unwrap();
        assert!(solution.is_complete());
        assert_eq!(solution.rail_path().len(), 7);
        assert_eq!(solution.satisfied_aliens, vec![Coord::new(2, 1)]);
        assert_eq!(solution.satisfied_houses, vec![Coord::new(1, 1)]);
    }

    #[test]
    fn test_one_rail_cannot_serve_two_colors() {
        let crowded = level("delivery")
            .with_alien(1, Coord::new(1, 2))
            .with_house(1, Coord::new(3, 2));
        let crowded = LevelDescription { colors: 2, ..crowded };

        let theory = theory(crowded);
        assert!(!theory.is_satisfiable().unwrap());
    }

    /// A loop past one alien twice: the alien touches two empty rails
    ///
    /// ```text
    /// X R R R
    /// . a A R
    /// E R R R
    /// ```
    fn shared_alien() -> LevelDescription {
        use Direction::*;
        LevelDescription::new(4, 3, 1, Coord::new(0, 0), Coord::new(0, 2))
            .with_rail(West, East, Coord::new(1, 0))
            .with_rail(West, East, Coord::new(2, 0))
            .with_rail(West, North, Coord::new(3, 0))
            .with_rail(South, North, Coord::new(3, 1))
            .with_rail(South, West, Coord::new(3, 2))
            .with_rail(East, West, Coord::new(2, 2))
            .with_rail(East, West, Coord::new(1, 2))
            .with_alien(0, Coord::new(1, 1))
            .with_house(0, Coord::new(2, 1))
    }

    /// A loop past one house twice, loaded both times: the first pass
    /// delivers, the second carries a later pickup on to another house
    ///
    /// ```text
    /// X R R R R
    /// . A A . R
    /// E R R R R
    /// . a . a .
    /// ```
    fn shared_house() -> LevelDescription {
        use Direction::*;
        LevelDescription::new(5, 4, 1, Coord::new(0, 1), Coord::new(0, 3))
            .with_rail(West, East, Coord::new(1, 1))
            .with_rail(West, East, Coord::new(2, 1))
            .with_rail(West, East, Coord::new(3, 1))
            .with_rail(West, North, Coord::new(4, 1))
            .with_rail(South, North, Coord::new(4, 2))
            .with_rail(South, West, Coord::new(4, 3))
            .with_rail(East, West, Coord::new(3, 3))
            .with_rail(East, West, Coord::new(2, 3))
            .with_rail(East, West, Coord::new(1, 3))
            .with_alien(0, Coord::new(1, 0))
            .with_alien(0, Coord::new(3, 0))
            .with_house(0, Coord::new(2, 2))
            .with_house(0, Coord::new(1, 2))
    }

    #[test]
    fn test_alien_served_by_earlier_rail() {
        let mut theory = theory(shared_alien());
        assert!(theory.is_satisfiable().unwrap());
        assert_eq!(theory.count_solutions(&[]).unwrap(), 1);

        let solution = theory.solve().unwrap();
        assert_eq!(solution.satisfied_aliens, vec![Coord::new(1, 1)]);
        assert_eq!(solution.satisfied_houses, vec![Coord::new(2, 1)]);
        let cargo: Vec<_> = solution.rail_path().iter().map(|s| s.cargo).collect();
        assert_eq!(cargo, vec![Some(0), None, None, None, None, None, None]);

        // picked up at (1, 0), never at (1, 2)
        let early = theory.parse_literal("after:0@1,0").unwrap();
        let late = theory.parse_literal("after:0@1,2").unwrap();
        assert_eq!(theory.likelihood(&early).unwrap(), 1.0);
        assert_eq!(theory.likelihood(&late).unwrap(), 0.0);

        let witness = solution.assignment();
        let forward = theory.comes_before(Coord::new(1, 0), Coord::new(1, 2)).unwrap();
        let backward = theory.comes_before(Coord::new(1, 2), Coord::new(1, 0)).unwrap();
        assert!(forward.evaluate(witness));
        assert!(!backward.evaluate(witness));
    }

    #[test]
    fn test_house_served_by_earlier_loaded_rail() {
        let theory = CosmicExpressTheory::with_backend(
            shared_house(),
            CdclBackend::new(SolverBackend::Varisat, Some(1_000)),
        )
        .unwrap();
        assert!(theory.is_satisfiable().unwrap());
        assert_eq!(theory.count_solutions(&[]).unwrap(), 1);

        let solution = theory.solve().unwrap();
        assert!(solution.is_complete());
        assert_eq!(solution.satisfied_aliens, vec![Coord::new(1, 0), Coord::new(3, 0)]);
        assert_eq!(solution.satisfied_houses, vec![Coord::new(1, 2), Coord::new(2, 2)]);

        let cargo: Vec<_> = solution.rail_path().iter().map(|s| s.cargo).collect();
        let mut expected = vec![Some(0); 9];
        expected[1] = None;
        expected[8] = None;
        assert_eq!(cargo, expected);

        // (2, 3) passes the first house loaded but leaves the drop-off to (2, 1)
        let kept = theory.parse_literal("after:0@2,3").unwrap();
        assert_eq!(theory.likelihood(&kept).unwrap(), 1.0);
    }

    #[test]
    fn test_unserved_alien_is_unsatisfiable() {
        // alien far away from the only rail
        let lonely = LevelDescription::new(3, 3, 1, Coord::new(0, 0), Coord::new(2, 0))
            .with_rail(Direction::West, Direction::East, Coord::new(1, 0))
            .with_alien(0, Coord::new(0, 2));
        let theory = theory(lonely);
        assert!(!theory.is_satisfiable().unwrap());
    }

    #[test]
    fn test_likelihood_bounds() {
        let theory = theory(level("delivery"));

        let implied = theory.parse_literal("after:0@1,1").unwrap();
        let contradicted = theory.parse_literal("~rail_out:E@2,1").unwrap();

        assert_eq!(theory.likelihood(&implied).unwrap(), 1.0);
        assert_eq!(theory.likelihood(&contradicted).unwrap(), 0.0);
    }

    #[test]
    fn test_malformed_level_rejected() {
        let mut bad = level("straight");
        bad.rails[0].coord = Coord::new(7, 0);
        assert!(matches!(
            CosmicExpressTheory::with_backend(bad, CdclBackend::default()),
            Err(TheoryError::MalformedLevel(LevelError::OutOfBounds { what: "rail", .. }))
        ));
    }

    #[test]
    fn test_literal_parsing_errors() {
        let theory = theory(level("straight"));
        assert!(matches!(theory.parse_literal("rail@9,9"), Err(TheoryError::UnknownProposition(_))));
        assert!(matches!(theory.parse_literal("nonsense"), Err(TheoryError::UnknownProposition(_))));
    }

    #[test]
    fn test_comes_before_on_theory() {
        let mut theory = theory(level("straight"));
        let cell = Coord::new(1, 0);
        assert!(theory.comes_before(cell, cell).unwrap().is_false());
        assert!(theory.comes_before(cell, Coord::new(1, 3)).unwrap().is_false());
    }

    #[test]
    fn test_statistics() {
        let theory = theory(level("straight"));
        let stats = theory.statistics();
        assert_eq!(stats.propositions, theory.encoding().propositions().len());
        assert!(stats.constraints > 0);
        assert!(stats.formula_size >= stats.propositions);
    }
}
