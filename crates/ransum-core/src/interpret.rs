use ransum_solver::{AMOUNT_EPSILON, RawSolveResult, SolveStatus};
use tracing::warn;

use crate::builder::nutrient_row_name;
use crate::catalog::FeedCategory;
use crate::nutrient::{Nutrient, NutrientProfile};
use crate::problem::{ConcentrationAnchor, RationProblem};

/// Relative slack under which a realized concentration still counts as meeting its minimum
pub const CHECK_TOLERANCE: f64 = 1e-6;

/// Days used when scaling a daily ration to a monthly cost
pub const DAYS_PER_MONTH: f64 = 30.0;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RationStatus {
    Optimal,
    Infeasible,
    NumericalFailure,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientAmount {
    pub name: String,
    pub kg: f64,
    /// `kg · unit_cost`
    pub cost: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adequacy {
    Satisfied,
    /// Short of the minimum by no more than solver noise
    WithinTolerance,
    Deficient,
}

/// Realized concentration of one nutrient against its minimum
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientCheck {
    pub nutrient: Nutrient,
    pub required: f64,
    pub realized: f64,
    /// Whether the problem enforced this minimum as a row
    pub enforced: bool,
    pub adequacy: Adequacy,
}

impl NutrientCheck {
    fn new(nutrient: Nutrient, required: f64, realized: f64, enforced: bool) -> Self {
        let adequacy = if realized >= required {
            Adequacy::Satisfied
        } else if required - realized <= CHECK_TOLERANCE * required.max(1.0) {
            Adequacy::WithinTolerance
        } else {
            Adequacy::Deficient
        };
        Self {
            nutrient,
            required,
            realized,
            enforced,
            adequacy,
        }
    }

    /// `realized - required`, in the nutrient's unit
    pub fn surplus(&self) -> f64 {
        self.realized - self.required
    }

    pub fn is_met(&self) -> bool {
        self.adequacy != Adequacy::Deficient
    }
}

/// A row that holds at equality in the optimal ration
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BindingConstraint {
    pub name: String,
    /// Change in total cost per unit increase of the row's right-hand side
    pub shadow_price: f64,
}

/// A requirement the selected ingredients could not meet
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub constraint: String,
    /// Set for nutrient rows; share and ratio rows have none
    pub nutrient: Option<Nutrient>,
    /// Minimum concentration for nutrient rows, raw row bound otherwise
    pub required: f64,
    /// What the cheapest mix ignoring the failed rows reaches, in the same terms
    pub achieved: f64,
    /// No mix of the selected ingredients can reach the minimum at all
    pub unattainable: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: FeedCategory,
    pub kg: f64,
    pub fraction: f64,
}

/// Daily totals scaled to a group of animals
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HerdTotals {
    pub head_count: u32,
    pub amounts: Vec<IngredientAmount>,
    pub total_kg: f64,
    pub total_cost: f64,
    pub monthly_cost: f64,
}

/// The interpreted outcome of one ration solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct RationSolution {
    pub status: RationStatus,
    /// Ingredients with a positive amount, in problem order (optimal only)
    pub amounts: Vec<IngredientAmount>,
    pub total_kg: f64,
    pub total_cost: f64,
    pub cost_per_kg: f64,
    /// Weighted concentration of every nutrient in the mix (optimal only)
    pub realized_nutrients: Option<NutrientProfile>,
    pub checks: Vec<NutrientCheck>,
    pub binding: Vec<BindingConstraint>,
    pub shortfalls: Vec<Shortfall>,
    pub category_shares: Vec<CategoryTotal>,
    pub message: String,
    pub iterations: usize,
}

impl RationSolution {
    fn failed(status: RationStatus, message: impl Into<String>, iterations: usize) -> Self {
        Self {
            status,
            amounts: Vec::new(),
            total_kg: 0.0,
            total_cost: 0.0,
            cost_per_kg: 0.0,
            realized_nutrients: None,
            checks: Vec::new(),
            binding: Vec::new(),
            shortfalls: Vec::new(),
            category_shares: Vec::new(),
            message: message.into(),
            iterations,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == RationStatus::Optimal
    }

    /// Amounts worth reporting; solver noise below `AMOUNT_EPSILON` kg is dropped
    pub fn significant_amounts(&self) -> impl Iterator<Item = &IngredientAmount> {
        self.amounts.iter().filter(|a| a.kg >= AMOUNT_EPSILON)
    }

    /// Kilograms of one ingredient, zero when unused
    pub fn amount(&self, name: &str) -> f64 {
        self.amounts
            .iter()
            .find(|a| a.name == name)
            .map_or(0.0, |a| a.kg)
    }

    pub fn realized(&self, nutrient: Nutrient) -> Option<f64> {
        self.realized_nutrients.map(|p| p.get(nutrient))
    }

    pub fn check(&self, nutrient: Nutrient) -> Option<&NutrientCheck> {
        self.checks.iter().find(|c| c.nutrient == nutrient)
    }

    pub fn is_binding(&self, constraint: &str) -> bool {
        self.binding.iter().any(|b| b.name == constraint)
    }

    pub fn for_herd(&self, head_count: u32) -> HerdTotals {
        let scale = f64::from(head_count);
        let total_cost = self.total_cost * scale;
        HerdTotals {
            head_count,
            amounts: self
                .significant_amounts()
                .map(|a| IngredientAmount {
                    name: a.name.clone(),
                    kg: a.kg * scale,
                    cost: a.cost * scale,
                })
                .collect(),
            total_kg: self.total_kg * scale,
            total_cost,
            monthly_cost: total_cost * DAYS_PER_MONTH,
        }
    }
}

/// Turn a raw solver result into a ration solution.
///
/// Arithmetic uses the raw amounts; `AMOUNT_EPSILON` only filters what is
/// displayed. A result the solver calls optimal but which has no usable
/// amounts is reported as a numerical failure, never as a ration.
pub fn interpret(problem: &RationProblem, raw: &RawSolveResult) -> RationSolution {
    match raw.status {
        SolveStatus::Optimal => match &raw.x {
            Some(x) => interpret_optimal(problem, raw, x),
            None => numerical_failure("solver reported success without a solution", raw.iterations),
        },
        SolveStatus::Infeasible => interpret_infeasible(problem, raw),
        SolveStatus::Unbounded | SolveStatus::Error => numerical_failure(&raw.message, raw.iterations),
    }
}

fn numerical_failure(reason: &str, iterations: usize) -> RationSolution {
    warn!(reason, "ration solve failed numerically");
    RationSolution::failed(
        RationStatus::NumericalFailure,
        format!("Numerical failure: {}", reason),
        iterations,
    )
}

fn interpret_optimal(problem: &RationProblem, raw: &RawSolveResult, x: &[f64]) -> RationSolution {
    let ingredients = &problem.ingredients;
    if x.len() != ingredients.len() {
        return numerical_failure(
            &format!("expected {} amounts, got {}", ingredients.len(), x.len()),
            raw.iterations,
        );
    }
    if x.iter().any(|v| !v.is_finite() || *v < -AMOUNT_EPSILON) {
        return numerical_failure("non-finite or negative amount", raw.iterations);
    }
    let x: Vec<f64> = x.iter().map(|v| v.max(0.0)).collect();

    let total_kg: f64 = x.iter().sum();
    let total_cost: f64 = x.iter().zip(ingredients).map(|(v, i)| v * i.unit_cost).sum();
    if total_kg <= 0.0 || !total_kg.is_finite() || !total_cost.is_finite() {
        return numerical_failure("zero or non-finite total", raw.iterations);
    }

    let amounts = x
        .iter()
        .zip(ingredients)
        .filter(|(v, _)| **v > 0.0)
        .map(|(v, i)| IngredientAmount {
            name: i.name.clone(),
            kg: *v,
            cost: v * i.unit_cost,
        })
        .collect();

    let mut realized = NutrientProfile::default();
    for nutrient in Nutrient::ALL {
        let mass: f64 = x.iter().zip(ingredients).map(|(v, i)| v * i.concentration(nutrient)).sum();
        realized.set(nutrient, mass / total_kg);
    }

    let checks = Nutrient::ALL
        .into_iter()
        .filter(|n| problem.requirement.minimum(*n) > 0.0 || problem.is_enforced(*n))
        .map(|n| NutrientCheck::new(n, problem.requirement.minimum(n), realized.get(n), problem.is_enforced(n)))
        .collect();

    let binding = raw
        .analysis
        .binding_constraints
        .iter()
        .map(|name| BindingConstraint {
            name: name.clone(),
            shadow_price: raw.analysis.shadow_price(name).unwrap_or(0.0),
        })
        .collect();

    let category_shares = [FeedCategory::Forage, FeedCategory::Concentrate, FeedCategory::Mineral]
        .into_iter()
        .filter_map(|category| {
            let kg: f64 = x
                .iter()
                .zip(ingredients)
                .filter(|(_, i)| i.category == category)
                .map(|(v, _)| v)
                .sum();
            (kg > 0.0).then(|| CategoryTotal {
                category,
                kg,
                fraction: kg / total_kg,
            })
        })
        .collect();

    RationSolution {
        status: RationStatus::Optimal,
        amounts,
        total_kg,
        total_cost,
        cost_per_kg: total_cost / total_kg,
        realized_nutrients: Some(realized),
        checks,
        binding,
        shortfalls: Vec::new(),
        category_shares,
        message: format!("Optimal ration: {:.3} kg at {:.2} per head per day", total_kg, total_cost),
        iterations: raw.iterations,
    }
}

fn interpret_infeasible(problem: &RationProblem, raw: &RawSolveResult) -> RationSolution {
    let relaxed = raw
        .relaxed_x
        .as_deref()
        .filter(|x| x.len() == problem.ingredients.len());

    let mut shortfalls: Vec<Shortfall> = raw
        .violations
        .iter()
        .map(|v| match row_nutrient(&v.constraint) {
            Some(nutrient) => Shortfall {
                constraint: v.constraint.clone(),
                nutrient: Some(nutrient),
                required: problem.requirement.minimum(nutrient),
                achieved: relaxed.map_or(0.0, |x| anchored_concentration(problem, nutrient, x)),
                unattainable: !attainable(problem, nutrient),
            },
            None => Shortfall {
                constraint: v.constraint.clone(),
                nutrient: None,
                required: v.required,
                achieved: v.actual,
                unattainable: false,
            },
        })
        .collect();

    // Minimums out of reach can hide behind a worse row; list them too
    for nutrient in problem.active_nutrient_constraints.iter() {
        let listed = shortfalls.iter().any(|s| s.nutrient == Some(nutrient));
        if !listed && !attainable(problem, nutrient) {
            shortfalls.push(Shortfall {
                constraint: nutrient_row_name(nutrient),
                nutrient: Some(nutrient),
                required: problem.requirement.minimum(nutrient),
                achieved: max_concentration(problem, nutrient),
                unattainable: true,
            });
        }
    }

    let message = match shortfalls.first() {
        Some(worst) => format!(
            "Infeasible: {} requirement(s) cannot be met with the selected ingredients, worst is {}",
            shortfalls.len(),
            worst.constraint
        ),
        None => format!("Infeasible: {}", raw.message),
    };

    RationSolution {
        shortfalls,
        ..RationSolution::failed(RationStatus::Infeasible, message, raw.iterations)
    }
}

fn row_nutrient(row: &str) -> Option<Nutrient> {
    Nutrient::ALL.into_iter().find(|n| nutrient_row_name(*n) == row)
}

/// Concentration the nutrient row measures at `x`, in the nutrient's unit
fn anchored_concentration(problem: &RationProblem, nutrient: Nutrient, x: &[f64]) -> f64 {
    let mass: f64 = x
        .iter()
        .zip(&problem.ingredients)
        .map(|(v, i)| v * i.concentration(nutrient))
        .sum();
    let basis = match problem.anchor {
        ConcentrationAnchor::MixConcentration => x.iter().sum(),
        ConcentrationAnchor::MinimumIntake => problem.min_total_kg,
    };
    if basis > 0.0 { mass / basis } else { 0.0 }
}

fn max_concentration(problem: &RationProblem, nutrient: Nutrient) -> f64 {
    problem
        .ingredients
        .iter()
        .map(|i| i.concentration(nutrient))
        .fold(0.0, f64::max)
}

fn attainable(problem: &RationProblem, nutrient: Nutrient) -> bool {
    let required = problem.requirement.minimum(nutrient);
    let best = max_concentration(problem, nutrient);
    match problem.anchor {
        ConcentrationAnchor::MixConcentration => best >= required,
        ConcentrationAnchor::MinimumIntake => best * problem.max_total_kg >= required * problem.min_total_kg,
    }
}
