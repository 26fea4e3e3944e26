//! Constraint generation for Cosmic Express levels

use super::{Descriptor, DescriptorKind, OrderingEngine, PropName, PropositionRegistry};
use crate::error::Result;
use crate::level::{Color, Coord, Direction, LevelDescription};
use crate::logic::{and, at_most_one_or_none, equiv, implies, none_of, or, Formula};
use std::collections::HashMap;
use strum::VariantArray;
use tracing::debug;

/// Key of a pickup or drop-off formula: the rail, the side facing the
/// alien or house, and the cargo color
type InteractionKey = (Coord, Direction, Color);

fn color(c: Color) -> Option<Descriptor> {
    Some(Descriptor::Color(c))
}

fn toward(d: Direction) -> Option<Descriptor> {
    Some(Descriptor::Direction(d))
}

/// Builds the theory of one level.
///
/// Owns the proposition registry and the ordering memo table; both live as
/// long as the generator and are never shared with another level.
#[derive(Debug)]
pub struct ConstraintGenerator {
    level: LevelDescription,
    registry: PropositionRegistry,
    ordering: OrderingEngine,
    pickups: HashMap<InteractionKey, Formula>,
    dropoffs: HashMap<InteractionKey, Formula>,
}

impl ConstraintGenerator {
    /// Validate the level and register every proposition of its grid.
    ///
    /// A malformed level is rejected here, before any constraint exists.
    pub fn new(level: LevelDescription) -> Result<Self> {
        level.validate()?;

        let registry = PropositionRegistry::new(level.cols, level.rows, level.colors);
        let ordering = OrderingEngine::new(level.cols, level.rows);

        let mut generator = Self {
            level,
            registry,
            ordering,
            pickups: HashMap::new(),
            dropoffs: HashMap::new(),
        };
        generator.register_propositions()?;
        Ok(generator)
    }

    fn register_propositions(&mut self) -> Result<()> {
        let cells: Vec<Coord> = self.level.cells().collect();
        for cell in cells {
            for name in PropName::TILES {
                self.registry.get_or_create(name, None, cell)?;
            }
            for name in [PropName::AlienColor, PropName::HouseColor, PropName::Before, PropName::After] {
                for c in 0..self.level.colors {
                    self.registry.get_or_create(name, color(c), cell)?;
                }
            }
            for name in [PropName::RailIn, PropName::RailOut] {
                for d in Direction::VARIANTS {
                    self.registry.get_or_create(name, toward(*d), cell)?;
                }
            }
            self.registry.get_or_create(PropName::AlienSatisfied, None, cell)?;
            self.registry.get_or_create(PropName::HouseSatisfied, None, cell)?;
        }

        debug!(
            event = "propositions_registered",
            count = self.registry.len(),
            cells = self.level.cell_count(),
        );
        Ok(())
    }

    /// Generate all constraints for the level
    pub fn generate_all_constraints(&mut self) -> Result<Vec<Formula>> {
        let mut constraints = Vec::new();
        let cells: Vec<Coord> = self.level.cells().collect();

        // 1. The level itself, as unit facts
        constraints.extend(self.generate_level_facts()?);
        let facts = constraints.len();

        // 2. Tile, color and rail shape structure
        for cell in &cells {
            constraints.extend(self.generate_tile_constraints(*cell)?);
            constraints.extend(self.generate_rail_shape_constraints(*cell)?);
            constraints.extend(self.generate_adjacency_constraints(*cell)?);
            constraints.extend(self.generate_terminal_constraints(*cell)?);
        }
        let structural = constraints.len() - facts;

        // 3. Train state carried between rails
        for cell in &cells {
            constraints.extend(self.generate_flow_constraints(*cell)?);
        }
        let flow = constraints.len() - facts - structural;

        // 4. Pickups, drop-offs and the cargo they leave behind
        for cell in &cells {
            constraints.extend(self.generate_interaction_constraints(*cell)?);
            constraints.extend(self.generate_satisfaction_constraints(*cell)?);
        }
        let interactions = constraints.len() - facts - structural - flow;

        debug!(
            event = "constraints_generated",
            facts,
            structural,
            flow,
            interactions,
            ordering_memo = self.ordering.memo_size(),
        );

        Ok(constraints)
    }

    /// The proposition for a key as a formula
    fn var(&self, name: PropName, descriptor: Option<Descriptor>, coord: Coord) -> Result<Formula> {
        Ok(Formula::var(self.registry.lookup(name, descriptor, coord)?))
    }

    /// Every descriptor variant of `name` at `coord`, in descriptor order
    fn variants(&self, name: PropName, coord: Coord) -> Result<Vec<Formula>> {
        if name.descriptor_kind() == Some(DescriptorKind::Color) && self.level.colors == 0 {
            return Ok(Vec::new());
        }
        Ok(self.registry.get_all(name, coord)?.into_iter().map(Formula::var).collect())
    }

    fn generate_level_facts(&self) -> Result<Vec<Formula>> {
        let level = &self.level;
        let mut facts = Vec::new();

        for entrance in &level.entrances {
            facts.push(self.var(PropName::Entrance, None, *entrance)?);
        }
        for exit in &level.exits {
            facts.push(self.var(PropName::Exit, None, *exit)?);
        }
        for alien in &level.aliens {
            facts.push(self.var(PropName::AlienColor, color(alien.color), alien.coord)?);
        }
        for house in &level.houses {
            facts.push(self.var(PropName::HouseColor, color(house.color), house.coord)?);
        }
        for obstacle in &level.obstacles {
            facts.push(self.var(PropName::Obstacle, None, *obstacle)?);
        }
        for rail in &level.rails {
            facts.push(self.var(PropName::RailIn, toward(rail.input), rail.coord)?);
            facts.push(self.var(PropName::RailOut, toward(rail.output), rail.coord)?);
        }

        let occupied: std::collections::HashSet<Coord> = level.occupied().map(|(_, c)| c).collect();
        for cell in level.cells().filter(|c| !occupied.contains(c)) {
            let tiles = PropName::TILES
                .iter()
                .map(|name| self.var(*name, None, cell))
                .collect::<Result<Vec<_>>>()?;
            facts.push(none_of(tiles));
        }

        Ok(facts)
    }

    /// At most one tile kind per cell, and tile presence tied to its colors
    fn generate_tile_constraints(&self, cell: Coord) -> Result<Vec<Formula>> {
        let tiles = PropName::TILES
            .iter()
            .map(|name| self.var(*name, None, cell))
            .collect::<Result<Vec<_>>>()?;

        let mut constraints = vec![at_most_one_or_none(tiles)];

        for (tile, colored) in [(PropName::Alien, PropName::AlienColor), (PropName::House, PropName::HouseColor)] {
            let present = self.var(tile, None, cell)?;
            let colors = self.variants(colored, cell)?;
            constraints.push(equiv(&present, &or(colors.iter().cloned())));
            constraints.push(at_most_one_or_none(colors));
        }

        Ok(constraints)
    }

    fn generate_rail_shape_constraints(&self, cell: Coord) -> Result<Vec<Formula>> {
        let rail = self.var(PropName::Rail, None, cell)?;
        let inputs = self.variants(PropName::RailIn, cell)?;
        let outputs = self.variants(PropName::RailOut, cell)?;

        let mut constraints = vec![
            equiv(&rail, &or(inputs.iter().cloned())),
            equiv(&rail, &or(outputs.iter().cloned())),
        ];

        for d in Direction::VARIANTS {
            let input = self.var(PropName::RailIn, toward(*d), cell)?;
            let output = self.var(PropName::RailOut, toward(*d), cell)?;
            constraints.push(and([input, output]).negate());
        }

        constraints.push(at_most_one_or_none(inputs));
        constraints.push(at_most_one_or_none(outputs));

        Ok(constraints)
    }

    /// Rails connect to a matching rail, or to the exit / entrance
    fn generate_adjacency_constraints(&self, cell: Coord) -> Result<Vec<Formula>> {
        let mut constraints = Vec::new();

        for d in Direction::VARIANTS {
            let input = self.var(PropName::RailIn, toward(*d), cell)?;
            let output = self.var(PropName::RailOut, toward(*d), cell)?;

            match self.level.neighbor(cell, *d) {
                Some(next) => {
                    let back = toward(d.opposite());
                    constraints.push(implies(
                        &output,
                        &or([
                            self.var(PropName::RailIn, back, next)?,
                            self.var(PropName::Exit, None, next)?,
                        ]),
                    ));
                    constraints.push(implies(
                        &input,
                        &or([
                            self.var(PropName::RailOut, back, next)?,
                            self.var(PropName::Entrance, None, next)?,
                        ]),
                    ));
                }
                // no side of a rail may face off the grid
                None => {
                    constraints.push(output.negate());
                    constraints.push(input.negate());
                }
            }
        }

        Ok(constraints)
    }

    /// An entrance feeds some rail; an exit is fed by some rail
    fn generate_terminal_constraints(&self, cell: Coord) -> Result<Vec<Formula>> {
        let mut fed = Vec::new();
        let mut feeding = Vec::new();
        for (d, next) in self.level.neighbors(cell) {
            fed.push(self.var(PropName::RailIn, toward(d.opposite()), next)?);
            feeding.push(self.var(PropName::RailOut, toward(d.opposite()), next)?);
        }

        Ok(vec![
            implies(&self.var(PropName::Entrance, None, cell)?, &or(fed)),
            implies(&self.var(PropName::Exit, None, cell)?, &or(feeding)),
        ])
    }

    fn generate_flow_constraints(&self, cell: Coord) -> Result<Vec<Formula>> {
        let rail = self.var(PropName::Rail, None, cell)?;
        let before = self.variants(PropName::Before, cell)?;
        let after = self.variants(PropName::After, cell)?;

        let mut constraints = vec![
            implies(&rail.negate(), &none_of(before.iter().chain(after.iter()).cloned())),
            at_most_one_or_none(before.iter().cloned()),
            at_most_one_or_none(after.iter().cloned()),
        ];

        for (d, next) in self.level.neighbors(cell) {
            let input = self.var(PropName::RailIn, toward(d), cell)?;
            let output = self.var(PropName::RailOut, toward(d), cell)?;

            let next_rail = self.var(PropName::Rail, None, next)?;
            let next_before = self.variants(PropName::Before, next)?;
            let linked = and([output.clone(), next_rail]);
            for (carried, received) in after.iter().zip(&next_before) {
                constraints.push(implies(&linked, &equiv(carried, received)));
            }

            // the train starts empty and must arrive empty
            let from_entrance = and([input, self.var(PropName::Entrance, None, next)?]);
            constraints.push(implies(&from_entrance, &none_of(before.iter().cloned())));
            let into_exit = and([output, self.var(PropName::Exit, None, next)?]);
            constraints.push(implies(&into_exit, &none_of(after.iter().cloned())));
        }

        Ok(constraints)
    }

    /// Formula for "the rail at `rail` picks up the color-`c` alien on its `side`"
    fn serves(&mut self, rail: Coord, side: Direction, c: Color) -> Result<Formula> {
        if let Some(cached) = self.pickups.get(&(rail, side, c)) {
            return Ok(cached.clone());
        }

        let formula = match self.level.neighbor(rail, side) {
            Some(alien) => {
                let mut parts = vec![
                    self.var(PropName::Rail, None, rail)?,
                    none_of(self.variants(PropName::Before, rail)?),
                    self.var(PropName::AlienColor, color(c), alien)?,
                ];

                // any other empty rail next to the alien must come later
                let rivals: Vec<Coord> = self
                    .level
                    .neighbors(alien)
                    .map(|(_, r)| r)
                    .filter(|r| *r != rail && self.level.has_rail(*r))
                    .collect();
                for rival in rivals {
                    let empty_rival = and([
                        self.var(PropName::Rail, None, rival)?,
                        none_of(self.variants(PropName::Before, rival)?),
                    ]);
                    let first = self.ordering.comes_before(&self.registry, rail, rival)?;
                    parts.push(implies(&empty_rival, &first));
                }
                and(parts)
            }
            None => Formula::contradiction(),
        };

        self.pickups.insert((rail, side, c), formula.clone());
        Ok(formula)
    }

    /// Formula for "the rail at `rail` drops color-`c` cargo at the house on its `side`"
    fn delivers(&mut self, rail: Coord, side: Direction, c: Color) -> Result<Formula> {
        if let Some(cached) = self.dropoffs.get(&(rail, side, c)) {
            return Ok(cached.clone());
        }

        let formula = match self.level.neighbor(rail, side) {
            Some(house) => {
                let mut parts = vec![
                    self.var(PropName::Rail, None, rail)?,
                    self.var(PropName::Before, color(c), rail)?,
                    self.var(PropName::HouseColor, color(c), house)?,
                ];

                // any other rail next to the house carrying c must come later
                let rivals: Vec<Coord> = self
                    .level
                    .neighbors(house)
                    .map(|(_, r)| r)
                    .filter(|r| *r != rail && self.level.has_rail(*r))
                    .collect();
                for rival in rivals {
                    let loaded_rival = and([
                        self.var(PropName::Rail, None, rival)?,
                        self.var(PropName::Before, color(c), rival)?,
                    ]);
                    let first = self.ordering.comes_before(&self.registry, rail, rival)?;
                    parts.push(implies(&loaded_rival, &first));
                }
                and(parts)
            }
            None => Formula::contradiction(),
        };

        self.dropoffs.insert((rail, side, c), formula.clone());
        Ok(formula)
    }

    /// Effects of pickups and drop-offs on the rail at `cell`
    fn generate_interaction_constraints(&mut self, cell: Coord) -> Result<Vec<Formula>> {
        let mut constraints = Vec::new();
        let mut all_pickups = Vec::new();
        let mut all_dropoffs = Vec::new();
        let sides: Vec<Direction> = self.level.neighbors(cell).map(|(d, _)| d).collect();

        let rail = self.var(PropName::Rail, None, cell)?;

        for c in 0..self.level.colors {
            let after = self.var(PropName::After, color(c), cell)?;
            let before = self.var(PropName::Before, color(c), cell)?;

            let mut pickups = Vec::new();
            let mut dropoffs = Vec::new();
            for side in &sides {
                let pickup = self.serves(cell, *side, c)?;
                let dropoff = self.delivers(cell, *side, c)?;

                constraints.push(implies(&pickup, &after));
                constraints.push(implies(&dropoff, &after.negate()));

                pickups.push(pickup);
                dropoffs.push(dropoff);
            }

            // cargo is kept unless dropped, or loaded by a pickup
            let picked = or(pickups.iter().cloned());
            let dropped = or(dropoffs.iter().cloned());
            let kept = and([before, dropped.negate()]);
            constraints.push(implies(&rail, &equiv(&after, &or([picked, kept]))));

            all_pickups.extend(pickups);
            all_dropoffs.extend(dropoffs);
        }

        constraints.push(at_most_one_or_none(all_pickups));
        constraints.push(at_most_one_or_none(all_dropoffs));

        Ok(constraints)
    }

    /// Satisfaction flags of the alien or house at `cell`
    fn generate_satisfaction_constraints(&mut self, cell: Coord) -> Result<Vec<Formula>> {
        let around: Vec<(Direction, Coord)> = self.level.neighbors(cell).collect();

        let mut served = Vec::new();
        let mut delivered = Vec::new();
        for (d, rail) in around {
            for c in 0..self.level.colors {
                served.push(self.serves(rail, d.opposite(), c)?);
                delivered.push(self.delivers(rail, d.opposite(), c)?);
            }
        }

        let alien_satisfied = self.var(PropName::AlienSatisfied, None, cell)?;
        let house_satisfied = self.var(PropName::HouseSatisfied, None, cell)?;

        Ok(vec![
            equiv(&alien_satisfied, &or(served)),
            implies(&self.var(PropName::Alien, None, cell)?, &alien_satisfied),
            equiv(&house_satisfied, &or(delivered)),
            implies(&self.var(PropName::House, None, cell)?, &house_satisfied),
        ])
    }

    /// Ordering predicate between two cells, sharing this level's memo table
    pub fn comes_before(&mut self, from: Coord, to: Coord) -> Result<Formula> {
        self.ordering.comes_before(&self.registry, from, to)
    }

    pub fn level(&self) -> &LevelDescription {
        &self.level
    }

    pub fn registry(&self) -> &PropositionRegistry {
        &self.registry
    }

    pub fn ordering(&self) -> &OrderingEngine {
        &self.ordering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LevelError, TheoryError};
    use crate::level::io::example_levels;
    use crate::logic::Assignment;

    fn level(name: &str) -> LevelDescription {
        example_levels()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| l)
            .unwrap()
    }

    /// The intended solution of `straight`: everything false except the facts
    /// and what they imply
    fn straight_solution(generator: &ConstraintGenerator) -> Assignment {
        let registry = generator.registry();
        let truths = [
            "entrance@0,0",
            "exit@2,0",
            "rail@1,0",
            "rail_in:W@1,0",
            "rail_out:E@1,0",
        ];
        let true_props: Vec<_> = truths
            .iter()
            .map(|k| registry.lookup_key(&k.parse().unwrap()).unwrap())
            .collect();

        registry.iter().map(|p| (*p, true_props.contains(p))).collect()
    }

    #[test]
    fn test_rejects_malformed_level() {
        let mut bad = level("straight");
        bad.exits.clear();
        assert!(matches!(
            ConstraintGenerator::new(bad),
            Err(TheoryError::MalformedLevel(LevelError::ExitCount(0)))
        ));
    }

    #[test]
    fn test_registers_every_cell() {
        let generator = ConstraintGenerator::new(level("delivery")).unwrap();
        // 6 tiles + 4 colored (1 color) + 8 directions + 2 flags per cell
        assert_eq!(generator.registry().len(), 15 * 20);
    }

    #[test]
    fn test_intended_solution_satisfies_constraints() {
        let mut generator = ConstraintGenerator::new(level("straight")).unwrap();
        let constraints = generator.generate_all_constraints().unwrap();
        let solution = straight_solution(&generator);

        for constraint in &constraints {
            assert!(constraint.evaluate(&solution));
        }
    }

    #[test]
    fn test_wrong_rail_direction_violates_constraints() {
        let mut generator = ConstraintGenerator::new(level("straight")).unwrap();
        let constraints = generator.generate_all_constraints().unwrap();
        let mut solution = straight_solution(&generator);

        let east = generator.registry().lookup_key(&"rail_out:E@1,0".parse().unwrap()).unwrap();
        let north = generator.registry().lookup_key(&"rail_out:N@1,0".parse().unwrap()).unwrap();
        solution.insert(east, false);
        solution.insert(north, true);

        assert!(constraints.iter().any(|c| !c.evaluate(&solution)));
    }

    #[test]
    fn test_comes_before_uses_owned_memo() {
        let mut generator = ConstraintGenerator::new(level("straight")).unwrap();
        let same = generator.comes_before(Coord::new(1, 0), Coord::new(1, 0)).unwrap();
        assert!(same.is_false());

        let f = generator.comes_before(Coord::new(0, 0), Coord::new(2, 0)).unwrap();
        assert!(!f.is_false());
        assert!(generator.ordering().memo_size() > 0);
    }

    #[test]
    fn test_rivals_are_placed_rails_only() {
        // the entrance and exit touch the only rail, but are never rivals of it
        let mut generator = ConstraintGenerator::new(level("straight")).unwrap();
        generator.generate_all_constraints().unwrap();
        assert_eq!(generator.ordering().memo_size(), 0);

        // an alien between two placed rails makes them rivals
        let mut generator = ConstraintGenerator::new(
            LevelDescription::new(3, 3, 1, Coord::new(0, 0), Coord::new(0, 2))
                .with_rail(Direction::West, Direction::East, Coord::new(1, 0))
                .with_rail(Direction::West, Direction::North, Coord::new(2, 0))
                .with_rail(Direction::South, Direction::North, Coord::new(2, 1))
                .with_rail(Direction::South, Direction::West, Coord::new(2, 2))
                .with_rail(Direction::East, Direction::West, Coord::new(1, 2))
                .with_alien(0, Coord::new(1, 1))
                .with_house(0, Coord::new(0, 1)),
        )
        .unwrap();
        generator.generate_all_constraints().unwrap();
        assert!(generator.ordering().memo_size() > 0);
    }
}
