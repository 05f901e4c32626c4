use std::fmt;

use ransum_solver::AMOUNT_EPSILON;

use crate::catalog::Ingredient;
use crate::interpret::{RationSolution, RationStatus};
use crate::nutrient::Nutrient;
use crate::problem::RationProblem;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MARGIN: f64 = 0.10;

/// Why a nutrient is worth reinforcing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reason {
    /// Met, but with less than the configured margin to spare
    NearMinimum { realized: f64, required: f64 },
    /// Below the minimum in the solved ration
    Deficient { realized: f64, required: f64 },
    /// Could not be met at all; the solve was infeasible
    Shortfall { achieved: f64, required: f64 },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NearMinimum { realized, required } => {
                write!(f, "only {:.2} against a minimum of {:.2}", realized, required)
            }
            Reason::Deficient { realized, required } => {
                write!(f, "deficient at {:.2}, minimum is {:.2}", realized, required)
            }
            Reason::Shortfall { achieved, required } => {
                write!(f, "cannot reach {:.2}, best mix gives {:.2}", required, achieved)
            }
        }
    }
}

/// An unused ingredient rich in a nutrient the ration is short on
#[derive(Debug, Clone, Copy)]
pub struct Suggestion<'a> {
    pub ingredient: &'a Ingredient,
    pub nutrient: Nutrient,
    /// The ingredient's concentration of `nutrient`
    pub concentration: f64,
    pub reason: Reason,
}

impl fmt::Display for Suggestion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {:.2}{}, {:.0}/kg): {} {}",
            self.ingredient.name,
            self.nutrient,
            self.concentration,
            self.nutrient.unit().symbol(),
            self.ingredient.unit_cost,
            self.nutrient,
            self.reason
        )
    }
}

/// Alternative ingredients for nutrients that are short or barely met.
///
/// Nothing is ranked until iterated, and `iter()` can be called any number
/// of times for the same sequence.
#[derive(Debug, Clone)]
pub struct Alternatives<'a> {
    problem: &'a RationProblem,
    solution: &'a RationSolution,
    candidates: &'a [Ingredient],
    top_k: usize,
    margin: f64,
}

impl<'a> Alternatives<'a> {
    pub fn new(problem: &'a RationProblem, solution: &'a RationSolution, candidates: &'a [Ingredient]) -> Self {
        Self {
            problem,
            solution,
            candidates,
            top_k: DEFAULT_TOP_K,
            margin: DEFAULT_MARGIN,
        }
    }

    /// Suggestions per nutrient
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Fraction above the minimum under which a nutrient still counts as tight
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Nutrients to reinforce, in nutrient order
    pub fn targets(&self) -> Vec<(Nutrient, Reason)> {
        match self.solution.status {
            RationStatus::Optimal => Nutrient::ALL
                .into_iter()
                .filter_map(|n| {
                    let required = self.problem.requirement.minimum(n);
                    let realized = self.solution.realized(n)?;
                    if required <= 0.0 || realized > (1.0 + self.margin) * required {
                        return None;
                    }
                    let met = self.solution.check(n).is_none_or(|c| c.is_met());
                    let reason = if met {
                        Reason::NearMinimum { realized, required }
                    } else {
                        Reason::Deficient { realized, required }
                    };
                    Some((n, reason))
                })
                .collect(),
            RationStatus::Infeasible => self
                .solution
                .shortfalls
                .iter()
                .filter_map(|s| {
                    s.nutrient.map(|n| {
                        (
                            n,
                            Reason::Shortfall {
                                achieved: s.achieved,
                                required: s.required,
                            },
                        )
                    })
                })
                .collect(),
            RationStatus::NumericalFailure => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Suggestion<'a>> + '_ {
        self.targets()
            .into_iter()
            .flat_map(move |(nutrient, reason)| self.ranked(nutrient, reason))
    }

    fn ranked(&self, nutrient: Nutrient, reason: Reason) -> impl Iterator<Item = Suggestion<'a>> + use<'a> {
        let mut unused: Vec<&'a Ingredient> = self
            .candidates
            .iter()
            .filter(|i| self.solution.amount(&i.name) < AMOUNT_EPSILON)
            .filter(|i| i.concentration(nutrient) > 0.0)
            .collect();
        unused.sort_by(|a, b| b.concentration(nutrient).total_cmp(&a.concentration(nutrient)));

        unused.into_iter().take(self.top_k).map(move |ingredient| Suggestion {
            ingredient,
            nutrient,
            concentration: ingredient.concentration(nutrient),
            reason,
        })
    }
}

/// Rank unused catalog ingredients by how much they carry of each nutrient
/// the solution is short on or barely meets.
pub fn suggest_alternatives<'a>(
    problem: &'a RationProblem,
    solution: &'a RationSolution,
    catalog_excluded: &'a [Ingredient],
) -> Alternatives<'a> {
    Alternatives::new(problem, solution, catalog_excluded)
}
