use rayon::prelude::*;
use tracing::debug;

use crate::error::RationError;
use crate::interpret::RationSolution;
use crate::optimizer::Optimizer;
use crate::problem::RationProblem;

/// One point of a price sweep
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct PricePoint {
    /// Multiplier applied to the ingredient's base unit cost
    pub factor: f64,
    pub unit_cost: f64,
    pub solution: RationSolution,
}

impl Optimizer {
    /// Solve independent problems in parallel; results keep the input order.
    pub fn solve_batch(&self, problems: &[RationProblem]) -> Vec<Result<RationSolution, RationError>> {
        debug!(problems = problems.len(), threads = rayon::current_num_threads(), "solving batch");
        problems.par_iter().map(|problem| self.optimize(problem)).collect()
    }

    /// Re-solve `problem` with one ingredient's unit cost scaled by each factor.
    ///
    /// Fails before solving anything if the ingredient is unknown or a scaled
    /// cost is invalid.
    pub fn price_sweep(
        &self,
        problem: &RationProblem,
        ingredient: &str,
        factors: &[f64],
    ) -> Result<Vec<PricePoint>, RationError> {
        let base = problem
            .ingredients
            .iter()
            .find(|i| i.name == ingredient)
            .map(|i| i.unit_cost)
            .ok_or_else(|| RationError::UnknownIngredient(ingredient.to_string()))?;

        let variants = factors
            .iter()
            .map(|&factor| {
                let unit_cost = base * factor;
                problem
                    .with_unit_cost(ingredient, unit_cost)
                    .map(|p| (factor, unit_cost, p))
            })
            .collect::<Result<Vec<_>, _>>()?;

        variants
            .into_par_iter()
            .map(|(factor, unit_cost, variant)| {
                self.optimize(&variant).map(|solution| PricePoint {
                    factor,
                    unit_cost,
                    solution,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::interpret::RationStatus;
    use crate::requirement::RequirementTable;

    fn problem(stage: &str) -> RationProblem {
        let requirement = RequirementTable::standard().resolve("beef cattle", stage).unwrap();
        RationProblem::new(Catalog::standard_feeds().ingredients().to_vec(), requirement, 5.0, 10.0).unwrap()
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let optimizer = Optimizer::new();
        let problems = vec![problem("adult"), problem("calf"), problem("fattening")];
        let batch = optimizer.solve_batch(&problems);

        assert_eq!(batch.len(), 3);
        for (problem, result) in problems.iter().zip(&batch) {
            let single = optimizer.optimize(problem).unwrap();
            let batched = result.as_ref().unwrap();
            assert_eq!(batched.status, single.status);
            assert!((batched.total_cost - single.total_cost).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cost_never_falls_as_price_rises() {
        let factors = [0.25, 0.5, 1.0, 1.5, 2.0, 4.0];
        let points = Optimizer::new()
            .price_sweep(&problem("adult"), "soybean meal", &factors)
            .unwrap();

        assert_eq!(points.len(), factors.len());
        assert!(points.iter().all(|p| p.solution.status == RationStatus::Optimal));
        assert_eq!(points[2].unit_cost, 8000.0);
        for pair in points.windows(2) {
            assert!(
                pair[1].solution.total_cost >= pair[0].solution.total_cost - 1e-6,
                "cost fell from {} to {} as price rose",
                pair[0].solution.total_cost,
                pair[1].solution.total_cost
            );
        }
    }

    #[test]
    fn test_sweep_rejects_unknown_ingredient_and_bad_factor() {
        let optimizer = Optimizer::new();
        assert_eq!(
            optimizer.price_sweep(&problem("adult"), "hay", &[1.0]).unwrap_err(),
            RationError::UnknownIngredient("hay".to_string())
        );
        assert!(optimizer.price_sweep(&problem("adult"), "rice bran", &[-1.0]).is_err());
    }
}
