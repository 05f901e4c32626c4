use crate::catalog::Ingredient;
use crate::interpret::{CHECK_TOLERANCE, RationSolution};
use crate::nutrient::Nutrient;
use crate::requirement::Requirement;

/// Kilograms of one supplement needed to lift one nutrient to its minimum
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientFix {
    pub nutrient: Nutrient,
    pub kg: f64,
}

/// Top-dressing an optimal ration with one mineral supplement
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementPlan {
    pub supplement: String,
    /// Largest of the per-nutrient amounts, so every fixable deficiency closes
    pub kg: f64,
    pub cost: f64,
    pub fixes: Vec<NutrientFix>,
    /// Deficient nutrients this supplement is not rich enough to close
    pub unresolved: Vec<Nutrient>,
    /// Nutrients that were met but fall below their minimum once `kg` is added
    pub diluted: Vec<Nutrient>,
}

/// For each supplement, the smallest top-up that brings every deficient
/// nutrient it can supply up to the minimum. Plans are sorted by cost.
///
/// Adding `x` kg of a supplement with concentration `c` to a ration of `T`
/// kg holding `S` of a nutrient gives `(S + c·x) / (T + x)`, so reaching `m`
/// takes `x = (m·T - S) / (c - m)`, which needs `c > m`.
pub fn plan_supplements(solution: &RationSolution, requirement: &Requirement, supplements: &[Ingredient]) -> Vec<SupplementPlan> {
    let Some(realized) = solution.realized_nutrients else {
        return Vec::new();
    };
    let total = solution.total_kg;

    let deficient: Vec<Nutrient> = Nutrient::ALL
        .into_iter()
        .filter(|n| is_short(realized.get(*n), requirement.minimum(*n)))
        .collect();
    if deficient.is_empty() {
        return Vec::new();
    }

    let mut plans: Vec<SupplementPlan> = supplements
        .iter()
        .filter_map(|supplement| {
            let mut fixes = Vec::new();
            let mut unresolved = Vec::new();
            for &nutrient in &deficient {
                let m = requirement.minimum(nutrient);
                let c = supplement.concentration(nutrient);
                if c > m {
                    let kg = (m * total - realized.get(nutrient) * total) / (c - m);
                    fixes.push(NutrientFix { nutrient, kg });
                } else {
                    unresolved.push(nutrient);
                }
            }
            if fixes.is_empty() {
                return None;
            }

            let kg = fixes.iter().map(|f| f.kg).fold(0.0, f64::max);
            let diluted = Nutrient::ALL
                .into_iter()
                .filter(|n| !deficient.contains(n))
                .filter(|n| {
                    let mixed = (realized.get(*n) * total + supplement.concentration(*n) * kg) / (total + kg);
                    is_short(mixed, requirement.minimum(*n))
                })
                .collect();

            Some(SupplementPlan {
                supplement: supplement.name.clone(),
                kg,
                cost: kg * supplement.unit_cost,
                fixes,
                unresolved,
                diluted,
            })
        })
        .collect();

    plans.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    plans
}

fn is_short(realized: f64, required: f64) -> bool {
    required > 0.0 && required - realized > CHECK_TOLERANCE * required.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, FeedCategory};
    use crate::interpret::interpret;
    use crate::nutrient::NutrientProfile;
    use crate::problem::RationProblem;
    use crate::requirement::{Animal, Purpose, SpeciesClass};
    use ransum_solver::{Analysis, RawSolveResult};

    fn solved(feed: NutrientProfile, minimums: NutrientProfile) -> (RationSolution, Requirement) {
        let feed = Ingredient::new("hay", 1000.0, FeedCategory::Forage, feed);
        let requirement = Requirement::new(SpeciesClass::new(Animal::Goat, Purpose::Meat), "adult", minimums);
        let problem = RationProblem::new(vec![feed], requirement.clone(), 10.0, 10.0).unwrap();
        let raw = RawSolveResult::optimal(vec![10.0], 10000.0, 1, Analysis::default());
        (interpret(&problem, &raw), requirement)
    }

    #[test]
    fn test_amount_accounts_for_dilution() {
        let (solution, requirement) = solved(
            NutrientProfile::new(12.0, 60.0).with(Nutrient::Ca, 0.2),
            NutrientProfile::new(10.0, 50.0).with(Nutrient::Ca, 0.4),
        );
        let limestone = Ingredient::new(
            "limestone",
            2500.0,
            FeedCategory::Mineral,
            NutrientProfile::default().with(Nutrient::Ca, 38.0),
        );
        let plans = plan_supplements(&solution, &requirement, &[limestone]);

        assert_eq!(plans.len(), 1);
        // (0.4·10 - 0.2·10) / (38 - 0.4)
        let expected = 2.0 / 37.6;
        assert!((plans[0].kg - expected).abs() < 1e-12);
        assert!((plans[0].cost - expected * 2500.0).abs() < 1e-9);
        let mixed = (0.2 * 10.0 + 38.0 * expected) / (10.0 + expected);
        assert!((mixed - 0.4).abs() < 1e-12);
        assert!(plans[0].diluted.is_empty());
    }

    #[test]
    fn test_plans_sorted_by_cost_and_weak_supplements_skipped() {
        let (solution, requirement) = solved(
            NutrientProfile::new(12.0, 60.0).with(Nutrient::Ca, 0.2).with(Nutrient::P, 0.1),
            NutrientProfile::new(10.0, 50.0).with(Nutrient::Ca, 0.4).with(Nutrient::P, 0.25),
        );
        let plans = plan_supplements(&solution, &requirement, Catalog::standard_minerals().ingredients());

        assert!(plans.windows(2).all(|w| w[0].cost <= w[1].cost));
        // Table salt carries 0.1 % Ca and no P; it closes nothing
        assert!(plans.iter().all(|p| p.supplement != "table salt"));

        let limestone = plans.iter().find(|p| p.supplement == "limestone").unwrap();
        // 0.1 % P is below the 0.25 % minimum
        assert_eq!(limestone.unresolved, vec![Nutrient::P]);
        let bone_meal = plans.iter().find(|p| p.supplement == "bone meal").unwrap();
        assert_eq!(bone_meal.fixes.len(), 2);
        assert!(bone_meal.unresolved.is_empty());
    }

    #[test]
    fn test_nothing_to_plan() {
        let (solution, requirement) = solved(
            NutrientProfile::new(12.0, 60.0).with(Nutrient::Ca, 0.5),
            NutrientProfile::new(10.0, 50.0).with(Nutrient::Ca, 0.4),
        );
        assert!(plan_supplements(&solution, &requirement, Catalog::standard_minerals().ingredients()).is_empty());
    }

    #[test]
    fn test_dilution_of_met_nutrients_reported() {
        // Protein sits exactly at its minimum, so any mineral top-up dilutes it
        let (solution, requirement) = solved(
            NutrientProfile::new(10.0, 60.0).with(Nutrient::Ca, 0.2),
            NutrientProfile::new(10.0, 50.0).with(Nutrient::Ca, 0.4),
        );
        let limestone = Catalog::standard_minerals().get("limestone").cloned().unwrap();
        let plans = plan_supplements(&solution, &requirement, &[limestone]);
        assert_eq!(plans[0].diluted, vec![Nutrient::Protein]);
    }
}
