//! Presentation-ready summary of a witness assignment

use super::{Descriptor, PropName};
use crate::level::{Color, Coord, Direction, LevelDescription};
use crate::logic::Assignment;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One rail visited by the train
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub coord: Coord,
    pub input: Option<Direction>,
    pub output: Option<Direction>,
    /// Color carried when leaving this rail
    pub cargo: Option<Color>,
}

/// A witness grouped by semantic name, with the rail path traced out
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    #[serde(skip)]
    assignment: Assignment,
    /// True propositions per name, in compact key form
    pub groups: BTreeMap<PropName, Vec<String>>,
    pub rail_path: Vec<PathStep>,
    /// Whether the traced path ends at the exit
    pub complete: bool,
    pub satisfied_aliens: Vec<Coord>,
    pub satisfied_houses: Vec<Coord>,
}

impl Solution {
    pub fn new(level: &LevelDescription, assignment: Assignment) -> Self {
        // descriptors of every true proposition, per (name, cell)
        let mut index: HashMap<(PropName, Coord), Vec<Option<Descriptor>>> = HashMap::new();
        for prop in assignment.true_propositions() {
            index.entry((prop.name(), prop.coord())).or_default().push(prop.descriptor());
        }

        let direction = |name: PropName, coord: Coord| -> Option<Direction> {
            index.get(&(name, coord))?.iter().find_map(|d| match d {
                Some(Descriptor::Direction(d)) => Some(*d),
                _ => None,
            })
        };
        let color = |name: PropName, coord: Coord| -> Option<Color> {
            index.get(&(name, coord))?.iter().find_map(|d| match d {
                Some(Descriptor::Color(c)) => Some(*c),
                _ => None,
            })
        };
        let holds = |name: PropName, coord: Coord| index.contains_key(&(name, coord));

        let mut rail_path = Vec::new();
        let mut complete = false;

        // first rail: the neighbor of the entrance whose input faces it
        let mut current = level.entrance().and_then(|entrance| {
            level
                .neighbors(entrance)
                .find(|(d, next)| direction(PropName::RailIn, *next) == Some(d.opposite()))
                .map(|(_, next)| next)
        });

        while let Some(coord) = current.take() {
            if rail_path.len() >= level.cell_count() || !holds(PropName::Rail, coord) {
                break;
            }

            let output = direction(PropName::RailOut, coord);
            rail_path.push(PathStep {
                coord,
                input: direction(PropName::RailIn, coord),
                output,
                cargo: color(PropName::After, coord),
            });

            let next = output.and_then(|d| level.neighbor(coord, d));
            if next.is_some() && next == level.exit() {
                complete = true;
            } else {
                current = next;
            }
        }

        let satisfied = |name: PropName| -> Vec<Coord> {
            let mut cells: Vec<Coord> = index
                .keys()
                .filter(|(n, _)| *n == name)
                .map(|(_, c)| *c)
                .collect();
            cells.sort();
            cells
        };
        let satisfied_aliens = satisfied(PropName::AlienSatisfied);
        let satisfied_houses = satisfied(PropName::HouseSatisfied);

        let groups = assignment
            .by_name()
            .into_iter()
            .map(|(name, props)| (name, props.iter().map(|p| p.key().to_string()).collect()))
            .collect();

        Self {
            assignment,
            groups,
            rail_path,
            complete,
            satisfied_aliens,
            satisfied_houses,
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn rail_path(&self) -> &[PathStep] {
        &self.rail_path
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::io::example_levels;
    use crate::theory::{PropKey, PropositionRegistry};

    fn delivery() -> LevelDescription {
        example_levels().remove(2).1
    }

    /// Hand-written witness for the delivery level
    fn delivery_witness(level: &LevelDescription) -> Assignment {
        let mut registry = PropositionRegistry::new(level.cols, level.rows, level.colors);
        let truths = [
            "entrance@0,1", "exit@4,1",
            "rail@1,1", "rail_in:W@1,1", "rail_out:E@1,1", "after:0@1,1",
            "rail@2,1", "rail_in:W@2,1", "rail_out:E@2,1", "before:0@2,1", "after:0@2,1",
            "rail@3,1", "rail_in:W@3,1", "rail_out:E@3,1", "before:0@3,1",
            "alien@1,0", "alien_color:0@1,0", "alien_satisfied@1,0",
            "house@3,0", "house_color:0@3,0", "house_satisfied@3,0",
        ];
        truths
            .iter()
            .map(|text| {
                let key: PropKey = text.parse().unwrap();
                (registry.get_or_create(key.name, key.descriptor, key.coord).unwrap(), true)
            })
            .collect()
    }

    #[test]
    fn test_traces_rail_path() {
        let level = delivery();
        let solution = Solution::new(&level, delivery_witness(&level));

        assert!(solution.is_complete());
        let coords: Vec<_> = solution.rail_path().iter().map(|s| s.coord).collect();
        assert_eq!(coords, vec![Coord::new(1, 1), Coord::new(2, 1), Coord::new(3, 1)]);
        assert_eq!(solution.rail_path()[0].cargo, Some(0));
        assert_eq!(solution.rail_path()[2].cargo, None);
        assert_eq!(solution.rail_path()[0].input, Some(Direction::West));
    }

    #[test]
    fn test_groups_and_satisfaction() {
        let level = delivery();
        let solution = Solution::new(&level, delivery_witness(&level));

        assert_eq!(solution.satisfied_aliens, vec![Coord::new(1, 0)]);
        assert_eq!(solution.satisfied_houses, vec![Coord::new(3, 0)]);
        assert_eq!(solution.groups[&PropName::Rail].len(), 3);
        assert_eq!(solution.groups[&PropName::Exit], vec!["exit@4,1".to_string()]);
    }

    #[test]
    fn test_json_output() {
        let level = delivery();
        let solution = Solution::new(&level, delivery_witness(&level));
        let json = solution.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["complete"], serde_json::Value::Bool(true));
        assert_eq!(value["rail_path"].as_array().unwrap().len(), 3);
        assert!(value["groups"]["rail_out"].is_array());
    }

    #[test]
    fn test_incomplete_path() {
        let level = delivery();
        let solution = Solution::new(&level, Assignment::new());
        assert!(!solution.is_complete());
        assert!(solution.rail_path().is_empty());
    }
}
