//! Named propositions and the registry that hands them out

use crate::error::{Result, TheoryError};
use crate::level::{Color, Coord, Direction};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr, VariantArray};

/// Semantic kind of a grid proposition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Display, EnumString, IntoStaticStr, VariantArray,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropName {
    /// The tile holds an alien
    Alien,
    /// The alien has the descriptor's color
    AlienColor,
    /// The tile holds a house
    House,
    /// The house has the descriptor's color
    HouseColor,
    Obstacle,
    Rail,
    /// The rail is entered from the descriptor's direction
    RailIn,
    /// The rail leaves through the descriptor's direction
    RailOut,
    Entrance,
    Exit,
    /// The train arrives at this rail carrying the descriptor's color
    Before,
    /// The train leaves this rail carrying the descriptor's color
    After,
    /// Some rail picks this alien up
    AlienSatisfied,
    /// Some rail drops an alien off at this house
    HouseSatisfied,
}

/// What kind of descriptor a name takes, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Color,
    Direction,
}

impl PropName {
    pub fn descriptor_kind(self) -> Option<DescriptorKind> {
        match self {
            PropName::AlienColor | PropName::HouseColor | PropName::Before | PropName::After => {
                Some(DescriptorKind::Color)
            }
            PropName::RailIn | PropName::RailOut => Some(DescriptorKind::Direction),
            _ => None,
        }
    }

    /// The six mutually exclusive tile kinds
    pub const TILES: [PropName; 6] = [
        PropName::Alien,
        PropName::House,
        PropName::Obstacle,
        PropName::Rail,
        PropName::Entrance,
        PropName::Exit,
    ];
}

/// Optional qualifier on a proposition: a cargo color or a rail direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    Color(Color),
    Direction(Direction),
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Color(c) => write!(f, "{c}"),
            Descriptor::Direction(d) => write!(f, "{}", d.letter()),
        }
    }
}

/// Value-comparable identity of a proposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PropKey {
    pub name: PropName,
    pub descriptor: Option<Descriptor>,
    pub coord: Coord,
}

impl PropKey {
    pub fn new(name: PropName, descriptor: Option<Descriptor>, coord: Coord) -> Self {
        Self { name, descriptor, coord }
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(descriptor) = self.descriptor {
            write!(f, ":{descriptor}")?;
        }
        write!(f, "@{},{}", self.coord.col, self.coord.row)
    }
}

/// Parses the compact `name[:descriptor]@col,row` form, e.g. `rail_out:E@2,1`
impl FromStr for PropKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (head, position) = s.split_once('@')
            .ok_or_else(|| format!("missing '@col,row' in '{s}'"))?;
        let (col, row) = position.split_once(',')
            .ok_or_else(|| format!("coordinate must be 'col,row' in '{s}'"))?;
        let coord = Coord::new(
            col.trim().parse().map_err(|_| format!("bad column in '{s}'"))?,
            row.trim().parse().map_err(|_| format!("bad row in '{s}'"))?,
        );

        let (name, descriptor) = match head.split_once(':') {
            Some((name, descriptor)) => (name, Some(descriptor)),
            None => (head, None),
        };
        let name = PropName::from_str(name.trim())
            .map_err(|_| format!("unknown proposition name '{name}'"))?;

        let descriptor = match (name.descriptor_kind(), descriptor) {
            (None, None) => None,
            (Some(DescriptorKind::Color), Some(d)) => Some(Descriptor::Color(
                d.trim().parse().map_err(|_| format!("bad color '{d}'"))?,
            )),
            (Some(DescriptorKind::Direction), Some(d)) => Some(Descriptor::Direction(
                Direction::from_str(d.trim()).map_err(|_| format!("bad direction '{d}'"))?,
            )),
            (Some(_), None) => return Err(format!("'{name}' needs a descriptor")),
            (None, Some(_)) => return Err(format!("'{name}' takes no descriptor")),
        };

        Ok(PropKey { name, descriptor, coord })
    }
}

/// An atomic boolean variable. Two propositions are equal iff they came from
/// the same registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Proposition {
    id: u32,
    key: PropKey,
}

impl Proposition {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn key(&self) -> PropKey {
        self.key
    }

    pub fn name(&self) -> PropName {
        self.key.name
    }

    pub fn descriptor(&self) -> Option<Descriptor> {
        self.key.descriptor
    }

    pub fn coord(&self) -> Coord {
        self.key.coord
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

/// Memoizing factory for the propositions of one theory instance.
///
/// Keys are checked against the grid and color count it was created for, so a
/// registry cannot be reused for a differently shaped level.
#[derive(Debug)]
pub struct PropositionRegistry {
    propositions: HashMap<PropKey, Proposition>,
    /// Every descriptor variant registered per (name, cell)
    variants: HashMap<(PropName, Coord), BTreeMap<Option<Descriptor>, Proposition>>,
    next_id: u32,
    cols: usize,
    rows: usize,
    colors: usize,
}

impl PropositionRegistry {
    pub fn new(cols: usize, rows: usize, colors: usize) -> Self {
        Self {
            propositions: HashMap::new(),
            variants: HashMap::new(),
            next_id: 0,
            cols,
            rows,
            colors,
        }
    }

    /// Get the proposition for a key, creating it on first request
    pub fn get_or_create(
        &mut self,
        name: PropName,
        descriptor: Option<Descriptor>,
        coord: Coord,
    ) -> Result<Proposition> {
        let key = PropKey::new(name, descriptor, coord);
        if let Some(prop) = self.propositions.get(&key) {
            return Ok(*prop);
        }

        self.validate_key(&key)?;

        let prop = Proposition { id: self.next_id, key };
        self.next_id += 1;
        self.propositions.insert(key, prop);
        self.variants.entry((name, coord)).or_default().insert(descriptor, prop);
        Ok(prop)
    }

    /// Look up an existing proposition without creating it
    pub fn lookup(&self, name: PropName, descriptor: Option<Descriptor>, coord: Coord) -> Result<Proposition> {
        let key = PropKey::new(name, descriptor, coord);
        self.propositions.get(&key)
            .copied()
            .ok_or_else(|| TheoryError::UnknownProposition(key.to_string()))
    }

    pub fn lookup_key(&self, key: &PropKey) -> Result<Proposition> {
        self.lookup(key.name, key.descriptor, key.coord)
    }

    /// Every descriptor variant registered for `name` at `coord`, in descriptor order
    pub fn get_all(&self, name: PropName, coord: Coord) -> Result<Vec<Proposition>> {
        match self.variants.get(&(name, coord)) {
            Some(variants) if !variants.is_empty() => Ok(variants.values().copied().collect()),
            _ => Err(TheoryError::UnknownProposition(format!("{name}:*@{},{}", coord.col, coord.row))),
        }
    }

    /// Number of propositions created so far
    pub fn len(&self) -> usize {
        self.propositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.propositions.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.cols, self.rows, self.colors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposition> {
        self.propositions.values()
    }

    fn validate_key(&self, key: &PropKey) -> Result<()> {
        if !key.coord.within(self.cols, self.rows) {
            return Err(TheoryError::UnknownProposition(format!(
                "{key} lies outside the {}x{} grid",
                self.cols, self.rows
            )));
        }

        match (key.name.descriptor_kind(), key.descriptor) {
            (None, None) | (Some(DescriptorKind::Direction), Some(Descriptor::Direction(_))) => Ok(()),
            (Some(DescriptorKind::Color), Some(Descriptor::Color(c))) if c < self.colors => Ok(()),
            _ => Err(TheoryError::UnknownProposition(format!(
                "{key} has no valid descriptor for a level with {} colors",
                self.colors
            ))),
        }
    }

    /// Get statistics about proposition usage
    pub fn statistics(&self) -> RegistryStatistics {
        let mut per_name = BTreeMap::new();
        for prop in self.propositions.values() {
            *per_name.entry(prop.name()).or_insert(0) += 1;
        }

        RegistryStatistics {
            total_propositions: self.len(),
            per_name,
        }
    }
}

/// Statistics about proposition usage
#[derive(Debug, Clone)]
pub struct RegistryStatistics {
    pub total_propositions: usize,
    pub per_name: BTreeMap<PropName, usize>,
}

impl fmt::Display for RegistryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Proposition Statistics:")?;
        writeln!(f, "  Total propositions: {}", self.total_propositions)?;
        for (name, count) in &self.per_name {
            writeln!(f, "  {name}: {count}")?;
        }
        Ok(())
    }
}
