use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    #[error("Linear program has no variables")]
    Empty,
    #[error("Row {row} has {found} coefficients, expected {expected}")]
    Dimension {
        row: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

/// A linear program in canonical form:
/// minimize `cost · x` subject to `A·x <= b`, `x >= 0`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LinearProgram {
    /// Variable names, one per column
    pub variables: Vec<String>,
    /// Objective coefficients (costs)
    pub cost: Vec<f64>,
    /// Inequality rows
    pub rows: Vec<Inequality>,
}

/// One row of `A·x <= b`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Inequality {
    /// Name/label for the row (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Right-hand side value
    pub rhs: f64,
    /// Whether the row may be dropped when diagnosing infeasibility
    pub relaxable: bool,
}

impl LinearProgram {
    pub fn new(variables: Vec<String>, cost: Vec<f64>) -> Self {
        Self {
            variables,
            cost,
            rows: Vec::new(),
        }
    }

    /// Add a hard row. Hard rows are kept when diagnosing infeasibility.
    pub fn add_row(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.rows.push(Inequality {
            name: name.into(),
            coefficients,
            rhs,
            relaxable: false,
        });
    }

    /// Add a row that the infeasibility diagnosis may relax.
    pub fn add_relaxable_row(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.rows.push(Inequality {
            name: name.into(),
            coefficients,
            rhs,
            relaxable: true,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn lhs_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.coefficients.clone()).collect()
    }

    pub fn rhs_vector(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.rhs).collect()
    }

    pub fn row(&self, name: &str) -> Option<&Inequality> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Check that every row and the cost vector match the variable count
    /// and that no coefficient is NaN or infinite.
    pub fn validate(&self) -> Result<(), LpError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(LpError::Empty);
        }
        if self.cost.len() != n {
            return Err(LpError::Dimension {
                row: "cost".to_string(),
                expected: n,
                found: self.cost.len(),
            });
        }
        if self.cost.iter().any(|c| !c.is_finite()) {
            return Err(LpError::NonFinite("cost".to_string()));
        }
        for row in &self.rows {
            if row.coefficients.len() != n {
                return Err(LpError::Dimension {
                    row: row.name.clone(),
                    expected: n,
                    found: row.coefficients.len(),
                });
            }
            if !row.rhs.is_finite() || row.coefficients.iter().any(|c| !c.is_finite()) {
                return Err(LpError::NonFinite(row.name.clone()));
            }
        }
        Ok(())
    }
}

impl Inequality {
    /// Left-hand side `a · x` at the given point
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(a, v)| a * v).sum()
    }

    /// How far `a · x` exceeds the right-hand side (zero or negative when satisfied)
    pub fn excess(&self, x: &[f64]) -> f64 {
        self.evaluate(x) - self.rhs
    }
}
