mod problem;
mod simplex;
mod solution;

pub use problem::{Inequality, LinearProgram, LpError};
pub use simplex::Solver;
pub use solution::{Analysis, ConstraintViolation, RawSolveResult, ShadowPrice, SolveStatus};

/// Amounts below this are treated as zero when reporting, never when summing.
pub const AMOUNT_EPSILON: f64 = 1e-3;
