pub mod builder;
pub mod catalog;
pub mod error;
pub mod intake;
pub mod interpret;
pub mod nutrient;
pub mod optimizer;
pub mod problem;
pub mod recommend;
pub mod requirement;
pub mod supplement;
pub mod sweep;

pub use builder::build;
pub use catalog::{Catalog, FeedCategory, Ingredient};
pub use error::RationError;
pub use intake::{IntakeGuide, IntakeWarning};
pub use interpret::{
    Adequacy, BindingConstraint, CategoryTotal, HerdTotals, IngredientAmount, NutrientCheck, RationSolution,
    RationStatus, Shortfall, interpret,
};
pub use nutrient::{Nutrient, NutrientProfile, NutrientSet, NutrientUnit};
pub use optimizer::Optimizer;
pub use problem::{CategoryShare, ConcentrationAnchor, NutrientRatio, RationProblem};
pub use recommend::{Alternatives, Reason, Suggestion, suggest_alternatives};
pub use requirement::{Animal, Purpose, Requirement, RequirementTable, SpeciesClass};
pub use supplement::{NutrientFix, SupplementPlan, plan_supplements};
pub use sweep::PricePoint;
