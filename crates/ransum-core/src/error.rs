use ransum_solver::LpError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RationError {
    #[error("No requirement for species '{species_class}' at life stage '{life_stage}'")]
    NotFound {
        species_class: String,
        life_stage: String,
    },
    #[error("Ration problem has no ingredients")]
    EmptyCatalog,
    #[error("Row {row} has {found} coefficients, expected {expected}")]
    Dimension {
        row: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in row {0}")]
    NonFinite(String),
    #[error("Invalid intake bounds: min {min} kg, max {max} kg")]
    InvalidBounds { min: f64, max: f64 },
    #[error("Invalid ingredient {name}: {reason}")]
    InvalidIngredient { name: String, reason: String },
    #[error("Duplicate ingredient: {0}")]
    DuplicateIngredient(String),
    #[error("Unknown ingredient: {0}")]
    UnknownIngredient(String),
    #[error("Invalid requirement {name}: {reason}")]
    InvalidRequirement { name: String, reason: String },
    #[error("Duplicate requirement for '{species_class}' at '{life_stage}'")]
    DuplicateRequirement {
        species_class: String,
        life_stage: String,
    },
    #[error("Unknown species class: {0}")]
    UnknownSpecies(String),
    #[error("Unknown nutrient: {0}")]
    UnknownNutrient(String),
    #[error("Fraction must be within 0..=1, got {0}")]
    InvalidFraction(f64),
    #[error("Invalid ratio {name}: {reason}")]
    InvalidRatio { name: String, reason: String },
    #[error("Body weight must be positive, got {0} kg")]
    InvalidBodyWeight(f64),
}

impl From<LpError> for RationError {
    fn from(e: LpError) -> Self {
        match e {
            LpError::Empty => RationError::EmptyCatalog,
            LpError::Dimension {
                row,
                expected,
                found,
            } => RationError::Dimension {
                row,
                expected,
                found,
            },
            LpError::NonFinite(row) => RationError::NonFinite(row),
        }
    }
}
