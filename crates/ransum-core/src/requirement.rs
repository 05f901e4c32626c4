use std::fmt;
use std::str::FromStr;

use crate::error::RationError;
use crate::nutrient::{Nutrient, NutrientProfile};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animal {
    Cattle,
    Goat,
    Sheep,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Meat,
    Dairy,
}

/// Species and production purpose, e.g. "beef cattle" or "dairy goat"
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeciesClass {
    pub animal: Animal,
    pub purpose: Purpose,
}

impl SpeciesClass {
    pub const ALL: [SpeciesClass; 6] = [
        SpeciesClass::new(Animal::Cattle, Purpose::Meat),
        SpeciesClass::new(Animal::Cattle, Purpose::Dairy),
        SpeciesClass::new(Animal::Goat, Purpose::Meat),
        SpeciesClass::new(Animal::Goat, Purpose::Dairy),
        SpeciesClass::new(Animal::Sheep, Purpose::Meat),
        SpeciesClass::new(Animal::Sheep, Purpose::Dairy),
    ];

    pub const fn new(animal: Animal, purpose: Purpose) -> Self {
        Self { animal, purpose }
    }
}

impl fmt::Display for SpeciesClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let purpose = match (self.purpose, self.animal) {
            (Purpose::Meat, Animal::Cattle) => "beef",
            (Purpose::Meat, _) => "meat",
            (Purpose::Dairy, _) => "dairy",
        };
        let animal = match self.animal {
            Animal::Cattle => "cattle",
            Animal::Goat => "goat",
            Animal::Sheep => "sheep",
        };
        write!(f, "{} {}", purpose, animal)
    }
}

impl FromStr for SpeciesClass {
    type Err = RationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut animal = None;
        let mut purpose = None;
        for word in normalize(s).split('-') {
            match word {
                "beef" | "meat" => purpose = Some(Purpose::Meat),
                "dairy" | "milk" => purpose = Some(Purpose::Dairy),
                "cattle" | "cow" | "cows" => animal = Some(Animal::Cattle),
                "goat" | "goats" => animal = Some(Animal::Goat),
                "sheep" => animal = Some(Animal::Sheep),
                _ => return Err(RationError::UnknownSpecies(s.to_string())),
            }
        }
        match (animal, purpose) {
            (Some(animal), Some(purpose)) => Ok(Self { animal, purpose }),
            _ => Err(RationError::UnknownSpecies(s.to_string())),
        }
    }
}

impl TryFrom<String> for SpeciesClass {
    type Error = RationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SpeciesClass> for String {
    fn from(class: SpeciesClass) -> Self {
        class.to_string()
    }
}

/// Minimum nutrient concentrations for one species class and life stage
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub species_class: SpeciesClass,
    pub life_stage: String,
    /// Same units as ingredient concentrations
    pub minimums: NutrientProfile,
}

impl Requirement {
    pub fn new(species_class: SpeciesClass, life_stage: impl Into<String>, minimums: NutrientProfile) -> Self {
        Self {
            species_class,
            life_stage: life_stage.into(),
            minimums,
        }
    }

    pub fn minimum(&self, nutrient: Nutrient) -> f64 {
        self.minimums.get(nutrient)
    }

    /// Generic ruminant minimums for callers that choose to fall back when
    /// a species and life stage are not in their table.
    pub fn fallback(species_class: SpeciesClass) -> Self {
        Self::new(species_class, "default", levels([12.0, 60.0, 0.40, 0.25, 0.10, 40.0, 8.0, 35.0]))
    }

    fn validate(&self) -> Result<(), RationError> {
        for (nutrient, value) in self.minimums.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(RationError::InvalidRequirement {
                    name: format!("{} / {}", self.species_class, self.life_stage),
                    reason: format!("minimum {} = {} must be finite and >= 0", nutrient, value),
                });
            }
        }
        Ok(())
    }
}

/// Requirement lookup keyed by species class and life stage.
///
/// Life stage matching ignores case and treats spaces, underscores and
/// hyphens alike, so "Lactating High" finds "lactating-high".
#[derive(Debug, Clone, Default)]
pub struct RequirementTable {
    records: Vec<Requirement>,
}

impl RequirementTable {
    pub fn from_records(records: Vec<Requirement>) -> Result<Self, RationError> {
        let mut table = Self { records: Vec::with_capacity(records.len()) };
        for record in records {
            record.validate()?;
            if table.find(record.species_class, &record.life_stage).is_some() {
                return Err(RationError::DuplicateRequirement {
                    species_class: record.species_class.to_string(),
                    life_stage: record.life_stage,
                });
            }
            table.records.push(record);
        }
        Ok(table)
    }

    /// Resolve a requirement from free-text species class and life stage.
    ///
    /// Unknown species or stages are reported, never substituted.
    pub fn resolve(&self, species_class: &str, life_stage: &str) -> Result<Requirement, RationError> {
        let not_found = || RationError::NotFound {
            species_class: species_class.to_string(),
            life_stage: life_stage.to_string(),
        };
        let class: SpeciesClass = species_class.parse().map_err(|_| not_found())?;
        self.find(class, life_stage).cloned().ok_or_else(not_found)
    }

    pub fn resolve_class(&self, species_class: SpeciesClass, life_stage: &str) -> Result<Requirement, RationError> {
        self.find(species_class, life_stage)
            .cloned()
            .ok_or_else(|| RationError::NotFound {
                species_class: species_class.to_string(),
                life_stage: life_stage.to_string(),
            })
    }

    pub fn life_stages(&self, species_class: SpeciesClass) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(move |r| r.species_class == species_class)
            .map(|r| r.life_stage.as_str())
    }

    pub fn records(&self) -> &[Requirement] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn find(&self, species_class: SpeciesClass, life_stage: &str) -> Option<&Requirement> {
        let stage = normalize(life_stage);
        self.records
            .iter()
            .find(|r| r.species_class == species_class && normalize(&r.life_stage) == stage)
    }

    /// Reference minimums for six ruminant classes
    pub fn standard() -> Self {
        use Animal::*;
        use Purpose::*;

        // protein %, TDN %, Ca %, P %, Mg %, Fe ppm, Cu ppm, Zn ppm
        let rows: [(Animal, Purpose, &str, [f64; 8]); 33] = [
            (Cattle, Meat, "calf", [18.0, 70.0, 0.70, 0.45, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Meat, "grower", [12.5, 65.0, 0.55, 0.35, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Meat, "adult", [10.5, 60.0, 0.35, 0.25, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Meat, "pregnant", [11.0, 65.0, 0.45, 0.30, 0.12, 50.0, 10.0, 40.0]),
            (Cattle, Meat, "fattening", [14.0, 70.0, 0.50, 0.30, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "calf", [18.0, 72.0, 0.70, 0.45, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "heifer", [15.0, 65.0, 0.60, 0.40, 0.10, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "pregnant-heifer", [12.0, 65.0, 0.60, 0.40, 0.16, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "lactating-low", [14.0, 65.0, 0.60, 0.40, 0.20, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "lactating-high", [16.0, 75.0, 0.80, 0.50, 0.25, 50.0, 10.0, 40.0]),
            (Cattle, Dairy, "dry", [12.0, 60.0, 0.45, 0.35, 0.16, 50.0, 10.0, 40.0]),
            (Goat, Meat, "kid", [16.0, 68.0, 0.60, 0.40, 0.10, 40.0, 10.0, 40.0]),
            (Goat, Meat, "grower", [14.0, 65.0, 0.45, 0.35, 0.10, 40.0, 10.0, 40.0]),
            (Goat, Meat, "adult", [12.0, 60.0, 0.35, 0.25, 0.10, 40.0, 8.0, 40.0]),
            (Goat, Meat, "pregnant", [14.0, 65.0, 0.50, 0.35, 0.12, 50.0, 10.0, 40.0]),
            (Goat, Meat, "fattening", [16.0, 70.0, 0.50, 0.30, 0.10, 40.0, 10.0, 40.0]),
            (Goat, Dairy, "kid", [18.0, 70.0, 0.70, 0.45, 0.10, 45.0, 10.0, 40.0]),
            (Goat, Dairy, "replacement", [14.0, 65.0, 0.55, 0.40, 0.10, 45.0, 10.0, 40.0]),
            (Goat, Dairy, "pregnant-replacement", [12.0, 65.0, 0.60, 0.40, 0.16, 45.0, 10.0, 40.0]),
            (Goat, Dairy, "lactating-low", [16.0, 65.0, 0.75, 0.45, 0.20, 45.0, 10.0, 40.0]),
            (Goat, Dairy, "lactating-high", [18.0, 75.0, 0.90, 0.55, 0.25, 45.0, 10.0, 40.0]),
            (Goat, Dairy, "dry", [12.0, 60.0, 0.45, 0.35, 0.16, 45.0, 10.0, 40.0]),
            (Sheep, Meat, "lamb", [16.0, 68.0, 0.60, 0.40, 0.10, 40.0, 7.0, 35.0]),
            (Sheep, Meat, "grower", [14.0, 65.0, 0.45, 0.35, 0.10, 40.0, 7.0, 35.0]),
            (Sheep, Meat, "adult", [12.0, 60.0, 0.35, 0.25, 0.10, 40.0, 7.0, 35.0]),
            (Sheep, Meat, "pregnant", [14.0, 65.0, 0.50, 0.35, 0.12, 50.0, 7.0, 35.0]),
            (Sheep, Meat, "fattening", [16.0, 70.0, 0.50, 0.30, 0.10, 40.0, 7.0, 35.0]),
            (Sheep, Dairy, "lamb", [18.0, 70.0, 0.70, 0.45, 0.10, 45.0, 7.0, 35.0]),
            (Sheep, Dairy, "replacement", [14.0, 65.0, 0.55, 0.40, 0.10, 45.0, 7.0, 35.0]),
            (Sheep, Dairy, "pregnant-replacement", [12.0, 65.0, 0.60, 0.40, 0.16, 45.0, 7.0, 35.0]),
            (Sheep, Dairy, "lactating-low", [16.0, 65.0, 0.75, 0.45, 0.20, 45.0, 7.0, 35.0]),
            (Sheep, Dairy, "lactating-high", [18.0, 75.0, 0.90, 0.55, 0.25, 45.0, 7.0, 35.0]),
            (Sheep, Dairy, "dry", [12.0, 60.0, 0.45, 0.35, 0.16, 45.0, 7.0, 35.0]),
        ];

        Self {
            records: rows
                .into_iter()
                .map(|(animal, purpose, stage, values)| {
                    Requirement::new(SpeciesClass::new(animal, purpose), stage, levels(values))
                })
                .collect(),
        }
    }
}

fn levels(values: [f64; 8]) -> NutrientProfile {
    Nutrient::ALL
        .into_iter()
        .zip(values)
        .fold(NutrientProfile::default(), |p, (n, v)| p.with(n, v))
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
