/// The outcome of one solver call
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct RawSolveResult {
    /// Solution status
    pub status: SolveStatus,
    /// Optimal values for each variable (present only when optimal)
    pub x: Option<Vec<f64>>,
    /// Objective value at `x`
    pub objective_value: f64,
    /// Human-readable outcome
    pub message: String,
    /// Simplex pivots performed across both phases
    pub iterations: usize,
    /// Dual information at the optimum
    pub analysis: Analysis,
    /// Rows violated by the best relaxed point (populated when infeasible)
    pub violations: Vec<ConstraintViolation>,
    /// Best point found with relaxable rows dropped (populated when infeasible)
    pub relaxed_x: Option<Vec<f64>>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// No point satisfies every row
    Infeasible,
    /// The objective decreases without limit
    Unbounded,
    /// Malformed input or the iteration limit was reached
    Error,
}

/// Dual information of an optimal basis
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// One entry per row, in row order
    pub shadow_prices: Vec<ShadowPrice>,
    /// Rows satisfied at equality
    pub binding_constraints: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ShadowPrice {
    /// Row name
    pub constraint: String,
    /// Change in optimal cost per unit increase of the row's right-hand side
    pub value: f64,
}

/// Information about a violated row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Row name
    pub constraint: String,
    /// Right-hand side of the row
    pub required: f64,
    /// Left-hand side reached by the relaxed point
    pub actual: f64,
    /// `actual - required`, always positive
    pub violation_amount: f64,
}

impl RawSolveResult {
    pub fn success(&self) -> bool {
        self.status == SolveStatus::Optimal && self.x.is_some()
    }

    pub fn optimal(x: Vec<f64>, objective_value: f64, iterations: usize, analysis: Analysis) -> Self {
        Self {
            status: SolveStatus::Optimal,
            x: Some(x),
            objective_value,
            message: "Optimization terminated successfully".to_string(),
            iterations,
            analysis,
            violations: Vec::new(),
            relaxed_x: None,
        }
    }

    pub fn infeasible(iterations: usize) -> Self {
        Self {
            status: SolveStatus::Infeasible,
            x: None,
            objective_value: f64::INFINITY,
            message: "No point satisfies all constraints".to_string(),
            iterations,
            analysis: Analysis::default(),
            violations: Vec::new(),
            relaxed_x: None,
        }
    }

    pub fn infeasible_with_relaxed(
        iterations: usize,
        relaxed_x: Vec<f64>,
        violations: Vec<ConstraintViolation>,
    ) -> Self {
        let message = match violations.first() {
            Some(worst) => format!(
                "No point satisfies all constraints; {} row(s) cannot be met, worst is {}",
                violations.len(),
                worst.constraint
            ),
            None => "No point satisfies all constraints".to_string(),
        };
        Self {
            message,
            violations,
            relaxed_x: Some(relaxed_x),
            ..Self::infeasible(iterations)
        }
    }

    pub fn unbounded(iterations: usize) -> Self {
        Self {
            status: SolveStatus::Unbounded,
            x: None,
            objective_value: f64::NEG_INFINITY,
            message: "Objective is unbounded below".to_string(),
            iterations,
            analysis: Analysis::default(),
            violations: Vec::new(),
            relaxed_x: None,
        }
    }

    pub fn error(message: impl Into<String>, iterations: usize) -> Self {
        Self {
            status: SolveStatus::Error,
            x: None,
            objective_value: f64::NAN,
            message: message.into(),
            iterations,
            analysis: Analysis::default(),
            violations: Vec::new(),
            relaxed_x: None,
        }
    }
}

impl Analysis {
    pub fn shadow_price(&self, constraint: &str) -> Option<f64> {
        self.shadow_prices
            .iter()
            .find(|sp| sp.constraint == constraint)
            .map(|sp| sp.value)
    }

    pub fn is_binding(&self, constraint: &str) -> bool {
        self.binding_constraints.iter().any(|c| c == constraint)
    }
}
