use ransum_solver::Solver;
use tracing::{debug, info, info_span, warn};

use crate::builder::build;
use crate::catalog::Ingredient;
use crate::error::RationError;
use crate::interpret::{RationSolution, RationStatus, interpret};
use crate::problem::RationProblem;
use crate::recommend::{Alternatives, DEFAULT_MARGIN, DEFAULT_TOP_K};

/// Builds, solves and interprets ration problems
#[derive(Debug, Clone)]
pub struct Optimizer {
    solver: Solver,
    top_k: usize,
    margin: f64,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            solver: Solver::new(),
            top_k: DEFAULT_TOP_K,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Suggestions per nutrient in `alternatives`
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Margin above a minimum that still counts as tight in `alternatives`
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Solve one ration problem.
    ///
    /// A malformed problem is an `Err`; an infeasible or numerically failed
    /// solve is a solution with that status.
    pub fn optimize(&self, problem: &RationProblem) -> Result<RationSolution, RationError> {
        let span = info_span!(
            "optimize",
            species = %problem.requirement.species_class,
            stage = %problem.requirement.life_stage
        );
        let _guard = span.enter();

        let lp = build(problem)?;
        let raw = self.solver.solve(&lp);
        debug!(status = ?raw.status, iterations = raw.iterations, "solver returned");

        let solution = interpret(problem, &raw);
        match solution.status {
            RationStatus::Optimal => info!(
                total_kg = solution.total_kg,
                total_cost = solution.total_cost,
                "ration optimal"
            ),
            RationStatus::Infeasible => info!(shortfalls = solution.shortfalls.len(), "ration infeasible"),
            RationStatus::NumericalFailure => warn!(message = %solution.message, "ration not usable"),
        }
        Ok(solution)
    }

    pub fn alternatives<'a>(
        &self,
        problem: &'a RationProblem,
        solution: &'a RationSolution,
        candidates: &'a [Ingredient],
    ) -> Alternatives<'a> {
        Alternatives::new(problem, solution, candidates)
            .with_top_k(self.top_k)
            .with_margin(self.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, FeedCategory};
    use crate::interpret::Adequacy;
    use crate::nutrient::{Nutrient, NutrientProfile};
    use crate::problem::{ConcentrationAnchor, NutrientRatio};
    use crate::requirement::{Animal, Purpose, Requirement, RequirementTable, SpeciesClass};

    const TOL: f64 = 1e-6;

    fn beef() -> SpeciesClass {
        SpeciesClass::new(Animal::Cattle, Purpose::Meat)
    }

    fn two_feeds(protein_min: f64) -> RationProblem {
        let a = Ingredient::new("A", 1000.0, FeedCategory::Forage, NutrientProfile::new(10.0, 50.0));
        let b = Ingredient::new("B", 8000.0, FeedCategory::Concentrate, NutrientProfile::new(42.0, 75.0));
        let requirement = Requirement::new(beef(), "adult", NutrientProfile::new(protein_min, 60.0));
        RationProblem::new(vec![a, b], requirement, 5.0, 10.0).unwrap()
    }

    fn standard_problem() -> RationProblem {
        let feeds = Catalog::standard_feeds().ingredients().to_vec();
        RationProblem::new(feeds, Requirement::fallback(beef()), 5.0, 10.0).unwrap()
    }

    #[test]
    fn test_two_feed_scenario() {
        let solution = Optimizer::new().optimize(&two_feeds(12.0)).unwrap();

        assert_eq!(solution.status, RationStatus::Optimal);
        // TDN binds at 60 %: 50a + 75b = 60(a + b) with a + b = 5
        assert!((solution.amount("A") - 3.0).abs() < TOL);
        assert!((solution.amount("B") - 2.0).abs() < TOL);
        assert!((solution.total_cost - 19000.0).abs() < 1e-3);
        assert!((solution.realized(Nutrient::Tdn).unwrap() - 60.0).abs() < TOL);
        assert!(solution.realized(Nutrient::Protein).unwrap() >= 12.0);
        assert!(solution.is_binding("tdn_min"));
        assert!(solution.is_binding("total_min"));
    }

    #[test]
    fn test_two_feed_scenario_anchored_to_minimum_intake() {
        let problem = two_feeds(12.0).with_anchor(ConcentrationAnchor::MinimumIntake);
        let solution = Optimizer::new().optimize(&problem).unwrap();

        // Six kg of A carries the nutrient mass of 5 kg at the minimums
        assert_eq!(solution.status, RationStatus::Optimal);
        assert!((solution.amount("A") - 6.0).abs() < TOL);
        assert!(solution.amount("B") < TOL);
        assert!((solution.total_cost - 6000.0).abs() < 1e-3);
        // ...diluted over 6 kg, so the concentration itself falls short
        let protein = solution.check(Nutrient::Protein).unwrap();
        assert_eq!(protein.adequacy, Adequacy::Deficient);
        assert!((protein.realized - 10.0).abs() < TOL);
    }

    #[test]
    fn test_unreachable_protein_is_infeasible() {
        let solution = Optimizer::new().optimize(&two_feeds(50.0)).unwrap();

        assert_eq!(solution.status, RationStatus::Infeasible);
        assert!(solution.amounts.is_empty());
        let worst = &solution.shortfalls[0];
        assert_eq!(worst.nutrient, Some(Nutrient::Protein));
        assert!(worst.unattainable);
        assert_eq!(worst.required, 50.0);
    }

    #[test]
    fn test_unit_round_trip_for_percent_and_ppm() {
        let minimums = NutrientProfile::new(12.0, 60.0)
            .with(Nutrient::Ca, 0.4)
            .with(Nutrient::Fe, 50.0)
            .with(Nutrient::Zn, 40.0);
        let feed = Ingredient::new("exact", 2000.0, FeedCategory::Concentrate, minimums);
        let requirement = Requirement::new(beef(), "adult", minimums);

        for anchor in [ConcentrationAnchor::MixConcentration, ConcentrationAnchor::MinimumIntake] {
            let problem = RationProblem::new(vec![feed.clone()], requirement.clone(), 7.0, 7.0)
                .unwrap()
                .with_minerals(Nutrient::MINERALS)
                .with_anchor(anchor);
            let solution = Optimizer::new().optimize(&problem).unwrap();

            assert_eq!(solution.status, RationStatus::Optimal, "{:?}", anchor);
            assert!((solution.total_kg - 7.0).abs() < TOL);
            for nutrient in [Nutrient::Protein, Nutrient::Ca, Nutrient::Fe, Nutrient::Zn] {
                let realized = solution.realized(nutrient).unwrap();
                assert!(
                    (realized - minimums.get(nutrient)).abs() < TOL,
                    "{:?}: {} realized {}",
                    anchor,
                    nutrient,
                    realized
                );
            }
        }
    }

    #[test]
    fn test_feasible_when_one_ingredient_meets_everything() {
        let requirement = RequirementTable::standard()
            .resolve("dairy cattle", "lactating-high")
            .unwrap();
        let complete = Ingredient::new("complete feed", 9000.0, FeedCategory::Concentrate, requirement.minimums);
        let mut feeds = Catalog::standard_feeds().ingredients().to_vec();
        feeds.push(complete);

        let problem = RationProblem::new(feeds, requirement, 12.0, 12.0)
            .unwrap()
            .with_minerals(Nutrient::MINERALS);
        let solution = Optimizer::new().optimize(&problem).unwrap();
        assert_eq!(solution.status, RationStatus::Optimal);
        assert!(solution.checks.iter().all(|c| c.is_met()));
    }

    #[test]
    fn test_totals_within_bounds_and_idempotent() {
        let optimizer = Optimizer::new();
        let problem = standard_problem();
        let first = optimizer.optimize(&problem).unwrap();
        let second = optimizer.optimize(&problem).unwrap();

        assert_eq!(first.status, RationStatus::Optimal);
        assert!(first.total_kg >= problem.min_total_kg - TOL);
        assert!(first.total_kg <= problem.max_total_kg + TOL);
        assert_eq!(first.status, second.status);
        assert!((first.total_cost - second.total_cost).abs() < 1e-9);
    }

    #[test]
    fn test_forage_share_and_calcium_phosphorus() {
        // Every standard concentrate is below 1.5:1, so calcium has to come from limestone
        let mut feeds = Catalog::standard_feeds().ingredients().to_vec();
        feeds.extend(Catalog::standard_minerals().select(&["limestone"]).unwrap());
        let problem = RationProblem::new(feeds, Requirement::fallback(beef()), 5.0, 10.0)
            .unwrap()
            .with_category_minimum(FeedCategory::Forage, 0.6)
            .unwrap()
            .with_ratio(NutrientRatio::calcium_phosphorus())
            .unwrap();
        let solution = Optimizer::new().optimize(&problem).unwrap();

        assert_eq!(solution.status, RationStatus::Optimal);
        let forage = solution
            .category_shares
            .iter()
            .find(|c| c.category == FeedCategory::Forage)
            .unwrap();
        assert!(forage.fraction >= 0.6 - TOL);

        let realized = solution.realized_nutrients.unwrap();
        let ratio = realized.ca / realized.p;
        assert!((1.5 - TOL..=2.0 + TOL).contains(&ratio), "Ca:P {}", ratio);
    }

    #[test]
    fn test_empty_problem_fails_fast() {
        let mut problem = two_feeds(12.0);
        problem.ingredients.clear();
        assert_eq!(
            Optimizer::new().optimize(&problem).unwrap_err(),
            RationError::EmptyCatalog
        );
    }

    #[test]
    fn test_alternatives_use_configured_top_k() {
        let optimizer = Optimizer::new().with_top_k(1);
        let problem = two_feeds(12.0);
        let solution = optimizer.optimize(&problem).unwrap();
        let catalog = Catalog::standard_feeds();

        let suggestions: Vec<_> = optimizer
            .alternatives(&problem, &solution, catalog.ingredients())
            .iter()
            .collect();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].nutrient, Nutrient::Tdn);
        assert_eq!(suggestions[0].ingredient.name, "ground corn");
    }
}
