use crate::catalog::{FeedCategory, Ingredient, validate_all};
use crate::error::RationError;
use crate::nutrient::{Nutrient, NutrientSet};
use crate::requirement::Requirement;

/// How a nutrient minimum is turned into a linear row.
///
/// `MinimumIntake` is the classic formulation that scales each minimum by
/// the minimum intake. `MixConcentration` is the default because it keeps
/// the realized concentration at or above every minimum whatever total the
/// solver picks; choose `MinimumIntake` when nutrient mass per head is what
/// matters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcentrationAnchor {
    /// `Σ c_i·x_i >= m·Σ x_i`: the mix concentration clears `m` at any total
    #[default]
    MixConcentration,
    /// `Σ c_i·x_i >= m·min_total_kg`: nutrient mass must cover the minimum
    /// intake; a larger total can dilute the concentration below `m`
    MinimumIntake,
}

/// Lower bound on the share of one feed category in the total mix
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryShare {
    pub category: FeedCategory,
    /// Fraction of total kg, within 0..=1
    pub min_fraction: f64,
}

/// Bounds on the mass ratio of two nutrients in the mix, e.g. Ca:P
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientRatio {
    pub numerator: Nutrient,
    pub denominator: Nutrient,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NutrientRatio {
    pub fn new(numerator: Nutrient, denominator: Nutrient, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            numerator,
            denominator,
            min,
            max,
        }
    }

    /// Calcium to phosphorus between 1.5:1 and 2:1
    pub fn calcium_phosphorus() -> Self {
        Self::new(Nutrient::Ca, Nutrient::P, Some(1.5), Some(2.0))
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }

    fn validate(&self) -> Result<(), RationError> {
        let invalid = |reason: &str| RationError::InvalidRatio {
            name: self.name(),
            reason: reason.to_string(),
        };
        if self.numerator == self.denominator {
            return Err(invalid("numerator and denominator are the same nutrient"));
        }
        if self.min.is_none() && self.max.is_none() {
            return Err(invalid("needs a min or a max"));
        }
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(invalid("bounds must be finite and >= 0"));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid("min exceeds max"));
            }
        }
        Ok(())
    }
}

/// One optimization instance.
///
/// Ingredient order defines variable order and is preserved in results.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct RationProblem {
    pub ingredients: Vec<Ingredient>,
    pub requirement: Requirement,
    pub min_total_kg: f64,
    pub max_total_kg: f64,
    /// Always contains protein and TDN
    pub active_nutrient_constraints: NutrientSet,
    pub category_shares: Vec<CategoryShare>,
    pub ratios: Vec<NutrientRatio>,
    pub anchor: ConcentrationAnchor,
}

impl RationProblem {
    pub fn new(
        ingredients: Vec<Ingredient>,
        requirement: Requirement,
        min_total_kg: f64,
        max_total_kg: f64,
    ) -> Result<Self, RationError> {
        if ingredients.is_empty() {
            return Err(RationError::EmptyCatalog);
        }
        validate_all(&ingredients)?;
        if !(min_total_kg.is_finite() && max_total_kg.is_finite())
            || min_total_kg <= 0.0
            || min_total_kg > max_total_kg
        {
            return Err(RationError::InvalidBounds {
                min: min_total_kg,
                max: max_total_kg,
            });
        }
        Ok(Self {
            ingredients,
            requirement,
            min_total_kg,
            max_total_kg,
            active_nutrient_constraints: NutrientSet::core(),
            category_shares: Vec::new(),
            ratios: Vec::new(),
            anchor: ConcentrationAnchor::default(),
        })
    }

    pub fn with_nutrient(mut self, nutrient: Nutrient) -> Self {
        self.active_nutrient_constraints.insert(nutrient);
        self
    }

    pub fn with_minerals(mut self, minerals: impl IntoIterator<Item = Nutrient>) -> Self {
        self.active_nutrient_constraints.extend(minerals);
        self
    }

    pub fn with_category_minimum(mut self, category: FeedCategory, min_fraction: f64) -> Result<Self, RationError> {
        if !(0.0..=1.0).contains(&min_fraction) {
            return Err(RationError::InvalidFraction(min_fraction));
        }
        self.category_shares.push(CategoryShare {
            category,
            min_fraction,
        });
        Ok(self)
    }

    pub fn with_ratio(mut self, ratio: NutrientRatio) -> Result<Self, RationError> {
        ratio.validate()?;
        self.ratios.push(ratio);
        Ok(self)
    }

    pub fn with_anchor(mut self, anchor: ConcentrationAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| i.name.clone()).collect()
    }

    pub fn is_enforced(&self, nutrient: Nutrient) -> bool {
        self.active_nutrient_constraints.contains(nutrient)
    }

    /// A copy of this problem with one ingredient's unit cost replaced
    pub fn with_unit_cost(&self, ingredient: &str, unit_cost: f64) -> Result<Self, RationError> {
        let mut problem = self.clone();
        let target = problem
            .ingredients
            .iter_mut()
            .find(|i| i.name == ingredient)
            .ok_or_else(|| RationError::UnknownIngredient(ingredient.to_string()))?;
        target.unit_cost = unit_cost;
        target.validate()?;
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::nutrient::NutrientProfile;
    use crate::requirement::RequirementTable;

    fn requirement() -> Requirement {
        RequirementTable::standard().resolve("beef cattle", "adult").unwrap()
    }

    #[test]
    fn test_bounds_validated() {
        let feeds = Catalog::standard_feeds().ingredients().to_vec();
        assert!(RationProblem::new(feeds.clone(), requirement(), 5.0, 10.0).is_ok());
        assert!(RationProblem::new(feeds.clone(), requirement(), 5.0, 5.0).is_ok());
        assert_eq!(
            RationProblem::new(feeds.clone(), requirement(), 0.0, 10.0).unwrap_err(),
            RationError::InvalidBounds { min: 0.0, max: 10.0 }
        );
        assert!(RationProblem::new(feeds.clone(), requirement(), 11.0, 10.0).is_err());
        assert!(RationProblem::new(feeds, requirement(), 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_duplicate_ingredient_names_rejected() {
        let cheap = Ingredient::new("A", 1000.0, FeedCategory::Forage, NutrientProfile::new(10.0, 50.0));
        let dear = Ingredient::new("A", 5000.0, FeedCategory::Concentrate, NutrientProfile::new(42.0, 75.0));
        assert_eq!(
            RationProblem::new(vec![dear, cheap], requirement(), 5.0, 10.0).unwrap_err(),
            RationError::DuplicateIngredient("A".to_string())
        );
    }

    #[test]
    fn test_invalid_ingredients_rejected() {
        let negative = Ingredient::new("odd", -100.0, FeedCategory::Mineral, NutrientProfile::new(0.0, 0.0));
        let result = RationProblem::new(vec![negative], requirement(), 5.0, 10.0);
        assert!(matches!(result, Err(RationError::InvalidIngredient { ref name, .. }) if name == "odd"));

        let rich = Ingredient::new(
            "rich",
            100.0,
            FeedCategory::Mineral,
            NutrientProfile::new(0.0, 0.0).with(Nutrient::Ca, 500.0),
        );
        assert!(RationProblem::new(vec![rich], requirement(), 5.0, 10.0).is_err());
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        assert_eq!(
            RationProblem::new(Vec::new(), requirement(), 5.0, 10.0).unwrap_err(),
            RationError::EmptyCatalog
        );
    }

    #[test]
    fn test_protein_and_tdn_always_enforced() {
        let feeds = Catalog::standard_feeds().ingredients().to_vec();
        let problem = RationProblem::new(feeds, requirement(), 5.0, 10.0)
            .unwrap()
            .with_nutrient(Nutrient::Ca);
        assert!(problem.is_enforced(Nutrient::Protein));
        assert!(problem.is_enforced(Nutrient::Tdn));
        assert!(problem.is_enforced(Nutrient::Ca));
        assert!(!problem.is_enforced(Nutrient::Zn));
    }

    #[test]
    fn test_shares_and_ratios_validated() {
        let feeds = Catalog::standard_feeds().ingredients().to_vec();
        let problem = RationProblem::new(feeds, requirement(), 5.0, 10.0).unwrap();

        assert_eq!(
            problem.clone().with_category_minimum(FeedCategory::Forage, 1.5).unwrap_err(),
            RationError::InvalidFraction(1.5)
        );
        assert!(problem.clone().with_category_minimum(FeedCategory::Forage, 0.4).is_ok());

        let same = NutrientRatio::new(Nutrient::Ca, Nutrient::Ca, Some(1.0), None);
        assert!(problem.clone().with_ratio(same).is_err());
        let inverted = NutrientRatio::new(Nutrient::Ca, Nutrient::P, Some(2.0), Some(1.0));
        assert!(problem.clone().with_ratio(inverted).is_err());
        assert!(problem.with_ratio(NutrientRatio::calcium_phosphorus()).is_ok());
    }

    #[test]
    fn test_with_unit_cost() {
        let feeds = Catalog::standard_feeds().ingredients().to_vec();
        let problem = RationProblem::new(feeds, requirement(), 5.0, 10.0).unwrap();

        let pricier = problem.with_unit_cost("rice bran", 4000.0).unwrap();
        assert_eq!(pricier.ingredients[3].unit_cost, 4000.0);
        assert_eq!(problem.ingredients[3].unit_cost, 3500.0);

        assert!(problem.with_unit_cost("rice bran", -1.0).is_err());
        assert!(problem.with_unit_cost("hay", 1.0).is_err());
    }
}
