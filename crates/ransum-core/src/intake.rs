use crate::catalog::FeedCategory;
use crate::error::RationError;
use crate::interpret::RationSolution;
use crate::requirement::{Animal, Purpose, SpeciesClass};

/// Share of the ideal forage or concentrate amount under which a ration is flagged
pub const SHARE_WARNING_LEVEL: f64 = 0.8;

/// Share of expected dry-matter intake under which a ration is flagged as too small
pub const INTAKE_WARNING_LEVEL: f64 = 0.9;

/// Daily dry-matter intake and forage share expected for an animal
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntakeGuide {
    pub species_class: SpeciesClass,
    pub body_weight_kg: f64,
    /// Dry-matter intake as a percentage of body weight
    pub dry_matter_pct: f64,
    /// Ideal forage fraction of the ration
    pub forage_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntakeWarning {
    /// Total ration well below the expected dry-matter intake
    LowIntake { total_kg: f64, expected_kg: f64 },
    /// Too little forage for rumen health
    LowForage { share: f64, ideal: f64 },
    /// Too little concentrate to reach production targets
    LowConcentrate { share: f64, ideal: f64 },
}

impl IntakeGuide {
    pub fn estimate(species_class: SpeciesClass, body_weight_kg: f64) -> Result<Self, RationError> {
        if !body_weight_kg.is_finite() || body_weight_kg <= 0.0 {
            return Err(RationError::InvalidBodyWeight(body_weight_kg));
        }

        let (dry_matter_pct, forage_share) = match (species_class.animal, species_class.purpose) {
            (Animal::Cattle, Purpose::Meat) => (2.2, 0.60),
            (Animal::Cattle, Purpose::Dairy) => (2.5, 0.40),
            (Animal::Goat | Animal::Sheep, Purpose::Meat) => (2.5, 0.65),
            (Animal::Goat | Animal::Sheep, Purpose::Dairy) => (3.0, 0.50),
        };

        Ok(Self {
            species_class,
            body_weight_kg,
            dry_matter_pct,
            forage_share,
        })
    }

    /// Expected dry matter per head per day, in kg
    pub fn dry_matter_kg(&self) -> f64 {
        self.body_weight_kg * self.dry_matter_pct / 100.0
    }

    pub fn herd_dry_matter_kg(&self, head_count: u32) -> f64 {
        self.dry_matter_kg() * f64::from(head_count)
    }

    pub fn concentrate_share(&self) -> f64 {
        1.0 - self.forage_share
    }

    pub fn minimum_forage_share(&self) -> f64 {
        self.forage_share * SHARE_WARNING_LEVEL
    }

    pub fn minimum_concentrate_share(&self) -> f64 {
        self.concentrate_share() * SHARE_WARNING_LEVEL
    }

    /// Flag an optimal ration that is too small or unbalanced for this animal.
    ///
    /// Low forage is reported ahead of low concentrate, and only one of the
    /// two is reported.
    pub fn review(&self, solution: &RationSolution) -> Vec<IntakeWarning> {
        let mut warnings = Vec::new();
        if !solution.is_optimal() {
            return warnings;
        }

        let expected_kg = self.dry_matter_kg();
        if solution.total_kg < expected_kg * INTAKE_WARNING_LEVEL {
            warnings.push(IntakeWarning::LowIntake {
                total_kg: solution.total_kg,
                expected_kg,
            });
        }

        let share = |category: FeedCategory| {
            solution
                .category_shares
                .iter()
                .find(|c| c.category == category)
                .map_or(0.0, |c| c.fraction)
        };
        let forage = share(FeedCategory::Forage);
        let concentrate = share(FeedCategory::Concentrate);
        if forage < self.minimum_forage_share() {
            warnings.push(IntakeWarning::LowForage {
                share: forage,
                ideal: self.forage_share,
            });
        } else if concentrate < self.minimum_concentrate_share() {
            warnings.push(IntakeWarning::LowConcentrate {
                share: concentrate,
                ideal: self.concentrate_share(),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Ingredient;
    use crate::interpret::interpret;
    use crate::nutrient::NutrientProfile;
    use crate::problem::RationProblem;
    use crate::requirement::Requirement;
    use ransum_solver::{Analysis, RawSolveResult};

    #[test]
    fn test_estimates_per_species() {
        let beef = IntakeGuide::estimate(SpeciesClass::new(Animal::Cattle, Purpose::Meat), 250.0).unwrap();
        assert!((beef.dry_matter_kg() - 5.5).abs() < 1e-12);
        assert!((beef.minimum_forage_share() - 0.48).abs() < 1e-12);
        assert!((beef.herd_dry_matter_kg(4) - 22.0).abs() < 1e-12);

        let dairy_goat = IntakeGuide::estimate(SpeciesClass::new(Animal::Goat, Purpose::Dairy), 40.0).unwrap();
        assert!((dairy_goat.dry_matter_kg() - 1.2).abs() < 1e-12);
        assert_eq!(dairy_goat.forage_share, 0.50);

        let meat_sheep = IntakeGuide::estimate(SpeciesClass::new(Animal::Sheep, Purpose::Meat), 30.0).unwrap();
        assert_eq!(meat_sheep.dry_matter_pct, 2.5);
        assert_eq!(meat_sheep.forage_share, 0.65);
    }

    #[test]
    fn test_rejects_bad_weight() {
        let class = SpeciesClass::new(Animal::Cattle, Purpose::Dairy);
        assert_eq!(
            IntakeGuide::estimate(class, 0.0).unwrap_err(),
            RationError::InvalidBodyWeight(0.0)
        );
        assert!(IntakeGuide::estimate(class, f64::NAN).is_err());
    }

    #[test]
    fn test_review_flags_small_and_forage_poor_ration() {
        let class = SpeciesClass::new(Animal::Cattle, Purpose::Meat);
        let hay = Ingredient::new("hay", 1000.0, FeedCategory::Forage, NutrientProfile::new(10.0, 50.0));
        let meal = Ingredient::new("meal", 8000.0, FeedCategory::Concentrate, NutrientProfile::new(42.0, 75.0));
        let requirement = Requirement::new(class, "adult", NutrientProfile::new(12.0, 60.0));
        let problem = RationProblem::new(vec![hay, meal], requirement, 4.0, 10.0).unwrap();
        let solution = interpret(
            &problem,
            &RawSolveResult::optimal(vec![1.0, 3.0], 25000.0, 2, Analysis::default()),
        );

        let guide = IntakeGuide::estimate(class, 250.0).unwrap();
        let warnings = guide.review(&solution);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], IntakeWarning::LowIntake { expected_kg, .. } if (expected_kg - 5.5).abs() < 1e-12));
        assert!(matches!(warnings[1], IntakeWarning::LowForage { share, .. } if (share - 0.25).abs() < 1e-12));
    }
}
