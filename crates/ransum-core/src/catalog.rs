use std::collections::HashSet;
use std::fmt;

use crate::error::RationError;
use crate::nutrient::{Nutrient, NutrientProfile, NutrientUnit};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedCategory {
    /// Roughage such as grass and straw
    Forage,
    /// Energy or protein dense feed
    #[default]
    Concentrate,
    /// Mineral supplement
    Mineral,
}

impl FeedCategory {
    pub fn name(self) -> &'static str {
        match self {
            FeedCategory::Forage => "forage",
            FeedCategory::Concentrate => "concentrate",
            FeedCategory::Mineral => "mineral",
        }
    }
}

impl fmt::Display for FeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One feed or mineral item
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    /// Currency per kilogram
    pub unit_cost: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: FeedCategory,
    pub nutrients: NutrientProfile,
}

impl Ingredient {
    pub fn new(
        name: impl Into<String>,
        unit_cost: f64,
        category: FeedCategory,
        nutrients: NutrientProfile,
    ) -> Self {
        Self {
            name: name.into(),
            unit_cost,
            category,
            nutrients,
        }
    }

    pub fn concentration(&self, nutrient: Nutrient) -> f64 {
        self.nutrients.get(nutrient)
    }

    pub fn validate(&self) -> Result<(), RationError> {
        let invalid = |reason: String| RationError::InvalidIngredient {
            name: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if !self.unit_cost.is_finite() || self.unit_cost < 0.0 {
            return Err(invalid(format!("unit cost {} must be finite and >= 0", self.unit_cost)));
        }
        for (nutrient, value) in self.nutrients.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} = {} must be finite and >= 0", nutrient, value)));
            }
            if nutrient.unit() == NutrientUnit::Percent && value > 100.0 {
                return Err(invalid(format!("{} = {}% exceeds 100%", nutrient, value)));
            }
        }
        Ok(())
    }
}

/// Validate each ingredient and reject repeated names
pub(crate) fn validate_all(ingredients: &[Ingredient]) -> Result<(), RationError> {
    let mut seen = HashSet::new();
    for ingredient in ingredients {
        ingredient.validate()?;
        if !seen.insert(ingredient.name.as_str()) {
            return Err(RationError::DuplicateIngredient(ingredient.name.clone()));
        }
    }
    Ok(())
}

/// An immutable, validated table of ingredients with unique names
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ingredients: Vec<Ingredient>,
}

impl Catalog {
    pub fn new(ingredients: Vec<Ingredient>) -> Result<Self, RationError> {
        validate_all(&ingredients)?;
        Ok(Self { ingredients })
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.name == name)
    }

    /// Clone the named ingredients, in the order given
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Ingredient>, RationError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .cloned()
                    .ok_or_else(|| RationError::UnknownIngredient(name.to_string()))
            })
            .collect()
    }

    /// Every ingredient not in `names`
    pub fn excluding<S: AsRef<str>>(&self, names: &[S]) -> Vec<Ingredient> {
        self.ingredients
            .iter()
            .filter(|i| !names.iter().any(|n| n.as_ref() == i.name))
            .cloned()
            .collect()
    }

    pub fn in_category(&self, category: FeedCategory) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(move |i| i.category == category)
    }

    /// Combine two catalogs, failing on a shared name
    pub fn merge(mut self, other: Catalog) -> Result<Self, RationError> {
        self.ingredients.extend(other.ingredients);
        Catalog::new(self.ingredients)
    }

    /// Fallback feed table: two forages and three concentrates
    pub fn standard_feeds() -> Self {
        let feed = |name: &str, category, protein, tdn, minerals: [f64; 6], cost| {
            Ingredient::new(name, cost, category, profile(protein, tdn, minerals))
        };
        Self {
            ingredients: vec![
                feed("elephant grass", FeedCategory::Forage, 10.2, 55.0, [0.5, 0.3, 0.2, 250.0, 10.0, 40.0], 1000.0),
                feed("rice straw", FeedCategory::Forage, 4.5, 43.0, [0.4, 0.2, 0.1, 200.0, 5.0, 30.0], 800.0),
                feed("soybean meal", FeedCategory::Concentrate, 42.0, 75.0, [0.3, 0.6, 0.3, 120.0, 15.0, 50.0], 8000.0),
                feed("rice bran", FeedCategory::Concentrate, 12.5, 65.0, [0.1, 0.5, 0.4, 300.0, 20.0, 70.0], 3500.0),
                feed("ground corn", FeedCategory::Concentrate, 9.0, 78.0, [0.1, 0.3, 0.2, 50.0, 8.0, 25.0], 5000.0),
            ],
        }
    }

    /// Fallback mineral supplement table
    pub fn standard_minerals() -> Self {
        let mineral = |name: &str, minerals: [f64; 6], cost| {
            Ingredient::new(name, cost, FeedCategory::Mineral, profile(0.0, 0.0, minerals))
        };
        Self {
            ingredients: vec![
                mineral("limestone", [38.0, 0.1, 0.5, 100.0, 0.0, 0.0], 2500.0),
                mineral("bone meal", [24.0, 12.0, 0.7, 500.0, 20.0, 50.0], 5000.0),
                mineral("mineral mix", [16.0, 8.0, 2.5, 2000.0, 1500.0, 1800.0], 15000.0),
                mineral("table salt", [0.1, 0.0, 0.1, 50.0, 5.0, 10.0], 8000.0),
                mineral("premix", [5.0, 2.0, 1.0, 4000.0, 2000.0, 5000.0], 25000.0),
            ],
        }
    }
}

/// Ca, P, Mg in percent then Fe, Cu, Zn in ppm
fn profile(protein: f64, tdn: f64, minerals: [f64; 6]) -> NutrientProfile {
    Nutrient::MINERALS
        .into_iter()
        .zip(minerals)
        .fold(NutrientProfile::new(protein, tdn), |p, (n, v)| p.with(n, v))
}
