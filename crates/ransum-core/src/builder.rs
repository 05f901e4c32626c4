use ransum_solver::LinearProgram;
use tracing::debug;

use crate::catalog::Ingredient;
use crate::error::RationError;
use crate::nutrient::Nutrient;
use crate::problem::{CategoryShare, ConcentrationAnchor, NutrientRatio, RationProblem};

pub const TOTAL_MIN_ROW: &str = "total_min";
pub const TOTAL_MAX_ROW: &str = "total_max";

/// Name of the row enforcing a nutrient minimum
pub fn nutrient_row_name(nutrient: Nutrient) -> String {
    format!("{}_min", nutrient.code())
}

/// Convert a ration problem into `minimize cost · x` subject to `A·x <= b`, `x >= 0`.
///
/// Nutrient rows are written in grams of nutrient per kilogram of feed, so
/// percent and ppm nutrients share one scale. Nutrient, share and ratio rows
/// are relaxable for infeasibility diagnosis; the intake rows are not.
pub fn build(problem: &RationProblem) -> Result<LinearProgram, RationError> {
    if problem.ingredients.is_empty() {
        return Err(RationError::EmptyCatalog);
    }
    if !(problem.min_total_kg > 0.0 && problem.min_total_kg <= problem.max_total_kg) {
        return Err(RationError::InvalidBounds {
            min: problem.min_total_kg,
            max: problem.max_total_kg,
        });
    }

    let cost = problem.ingredients.iter().map(|i| i.unit_cost).collect();
    let mut lp = LinearProgram::new(problem.ingredient_names(), cost);

    for nutrient in problem.active_nutrient_constraints.iter() {
        add_nutrient_row(&mut lp, problem, nutrient);
    }

    // Total intake bounds
    let n = problem.ingredients.len();
    lp.add_row(TOTAL_MIN_ROW, vec![-1.0; n], -problem.min_total_kg);
    lp.add_row(TOTAL_MAX_ROW, vec![1.0; n], problem.max_total_kg);

    for share in &problem.category_shares {
        add_share_row(&mut lp, &problem.ingredients, share);
    }

    for ratio in &problem.ratios {
        add_ratio_rows(&mut lp, &problem.ingredients, ratio);
    }

    lp.validate()?;

    debug!(
        variables = lp.num_variables(),
        rows = lp.num_rows(),
        anchor = ?problem.anchor,
        "built ration program"
    );

    Ok(lp)
}

fn add_nutrient_row(lp: &mut LinearProgram, problem: &RationProblem, nutrient: Nutrient) {
    let required = nutrient.to_grams_per_kg(problem.requirement.minimum(nutrient));
    let grams = |i: &Ingredient| nutrient.to_grams_per_kg(i.concentration(nutrient));

    match problem.anchor {
        // Σ c_i·x_i >= m·Σ x_i  =>  Σ (m - c_i)·x_i <= 0
        ConcentrationAnchor::MixConcentration => {
            let coeffs = problem.ingredients.iter().map(|i| required - grams(i)).collect();
            lp.add_relaxable_row(nutrient_row_name(nutrient), coeffs, 0.0);
        }
        // Σ c_i·x_i >= m·min_total  =>  Σ -c_i·x_i <= -m·min_total
        ConcentrationAnchor::MinimumIntake => {
            let coeffs = problem.ingredients.iter().map(|i| -grams(i)).collect();
            lp.add_relaxable_row(nutrient_row_name(nutrient), coeffs, -required * problem.min_total_kg);
        }
    }
}

/// Σ_{i∈S} x_i >= f·Σ x_i  =>  Σ_{i∈S} (f - 1)·x_i + Σ_{i∉S} f·x_i <= 0
fn add_share_row(lp: &mut LinearProgram, ingredients: &[Ingredient], share: &CategoryShare) {
    let f = share.min_fraction;
    let coeffs = ingredients
        .iter()
        .map(|i| if i.category == share.category { f - 1.0 } else { f })
        .collect();
    lp.add_relaxable_row(format!("{}_share_min", share.category), coeffs, 0.0);
}

/// A ratio `num / den` between bounds, linearized on nutrient mass:
/// - For min R: num >= R·den  =>  R·den - num <= 0
/// - For max R: num <= R·den  =>  num - R·den <= 0
fn add_ratio_rows(lp: &mut LinearProgram, ingredients: &[Ingredient], ratio: &NutrientRatio) {
    let num: Vec<f64> = ingredients
        .iter()
        .map(|i| ratio.numerator.to_grams_per_kg(i.concentration(ratio.numerator)))
        .collect();
    let den: Vec<f64> = ingredients
        .iter()
        .map(|i| ratio.denominator.to_grams_per_kg(i.concentration(ratio.denominator)))
        .collect();

    if let Some(r) = ratio.min {
        let coeffs = num.iter().zip(&den).map(|(n, d)| r * d - n).collect();
        lp.add_relaxable_row(format!("{}_min", ratio.name()), coeffs, 0.0);
    }
    if let Some(r) = ratio.max {
        let coeffs = num.iter().zip(&den).map(|(n, d)| n - r * d).collect();
        lp.add_relaxable_row(format!("{}_max", ratio.name()), coeffs, 0.0);
    }
}
