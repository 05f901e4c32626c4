use tracing::{debug, trace, warn};

use crate::problem::{Inequality, LinearProgram};
use crate::solution::{Analysis, ConstraintViolation, RawSolveResult, ShadowPrice};

/// Simplex solver for linear programs in `A·x <= b, x >= 0` form
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots across both phases before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Consecutive degenerate pivots tolerated before switching to Bland's rule
    degenerate_limit: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
            degenerate_limit: 50,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_degenerate_limit(mut self, limit: usize) -> Self {
        self.degenerate_limit = limit;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the linear program using the two-phase simplex method.
    ///
    /// Infeasibility is reported as a status, together with the rows a
    /// relaxed solve could not satisfy.
    pub fn solve(&self, problem: &LinearProgram) -> RawSolveResult {
        if let Err(e) = problem.validate() {
            warn!(error = %e, "rejecting malformed linear program");
            return RawSolveResult::error(e.to_string(), 0);
        }

        debug!(
            variables = problem.num_variables(),
            rows = problem.num_rows(),
            "solving linear program"
        );

        let rows: Vec<&Inequality> = problem.rows.iter().collect();
        match self.run(&problem.cost, &rows) {
            Run::Optimal { x, duals, iterations } => {
                let analysis = self.analyze(problem, &x, |i| duals[i]);
                let objective_value = dot(&problem.cost, &x);
                debug!(iterations, objective_value, "optimal");
                RawSolveResult::optimal(x, objective_value, iterations, analysis)
            }
            Run::Infeasible { iterations } => self.diagnose(problem, iterations),
            Run::Unbounded { iterations } => {
                debug!(iterations, "unbounded");
                RawSolveResult::unbounded(iterations)
            }
            Run::IterationLimit { iterations } => {
                warn!(iterations, "simplex iteration limit reached");
                RawSolveResult::error(
                    format!("Iteration limit of {} reached", self.max_iterations),
                    iterations,
                )
            }
        }
    }

    /// When the full problem is infeasible, re-solve keeping only the hard
    /// rows and report which relaxable rows the cheapest such point violates.
    fn diagnose(&self, problem: &LinearProgram, iterations: usize) -> RawSolveResult {
        let hard: Vec<&Inequality> = problem.rows.iter().filter(|r| !r.relaxable).collect();
        if hard.len() == problem.rows.len() {
            debug!(iterations, "infeasible with no relaxable rows");
            return RawSolveResult::infeasible(iterations);
        }

        let (x, hard_duals, total) = match self.run(&problem.cost, &hard) {
            Run::Optimal { x, duals, iterations: relaxed } => (x, duals, iterations + relaxed),
            Run::Infeasible { iterations: relaxed }
            | Run::Unbounded { iterations: relaxed }
            | Run::IterationLimit { iterations: relaxed } => {
                debug!("hard rows alone are infeasible");
                return RawSolveResult::infeasible(iterations + relaxed);
            }
        };

        let violations = self.find_violations(problem, &x);
        if violations.is_empty() {
            // Phase 1 gave up on a point that satisfies every row
            let mut hard_index = 0;
            let duals: Vec<f64> = problem
                .rows
                .iter()
                .map(|r| {
                    if r.relaxable {
                        0.0
                    } else {
                        hard_index += 1;
                        hard_duals[hard_index - 1]
                    }
                })
                .collect();
            let analysis = self.analyze(problem, &x, |i| duals[i]);
            let objective_value = dot(&problem.cost, &x);
            return RawSolveResult::optimal(x, objective_value, total, analysis);
        }

        debug!(violated = violations.len(), "infeasible");
        RawSolveResult::infeasible_with_relaxed(total, x, violations)
    }

    /// Find which relaxable rows are violated at a given point, worst first
    fn find_violations(&self, problem: &LinearProgram, x: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations: Vec<ConstraintViolation> = problem
            .rows
            .iter()
            .filter(|r| r.relaxable)
            .filter_map(|r| {
                let actual = r.evaluate(x);
                let amount = actual - r.rhs;
                (amount > self.feasibility_tolerance(r.rhs)).then(|| ConstraintViolation {
                    constraint: r.name.clone(),
                    required: r.rhs,
                    actual,
                    violation_amount: amount,
                })
            })
            .collect();

        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }

    fn analyze(&self, problem: &LinearProgram, x: &[f64], dual: impl Fn(usize) -> f64) -> Analysis {
        let shadow_prices = problem
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| ShadowPrice {
                constraint: r.name.clone(),
                value: clean(dual(i), self.tolerance),
            })
            .collect();

        let binding_constraints = problem
            .rows
            .iter()
            .filter(|r| r.excess(x).abs() <= self.feasibility_tolerance(r.rhs))
            .map(|r| r.name.clone())
            .collect();

        Analysis {
            shadow_prices,
            binding_constraints,
        }
    }

    fn feasibility_tolerance(&self, rhs: f64) -> f64 {
        1e-7 * (1.0 + rhs.abs())
    }

    fn run(&self, cost: &[f64], rows: &[&Inequality]) -> Run {
        let mut tableau = Tableau::new(cost, rows);
        let mut iterations = 0;

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut iterations) {
                Step::Optimal => {}
                Step::Unbounded => return Run::Infeasible { iterations },
                Step::Limit => return Run::IterationLimit { iterations },
            }

            let residual = tableau.artificial_sum();
            if residual > 1e-7 * tableau.scale {
                trace!(residual, "phase 1 left artificials in the basis");
                return Run::Infeasible { iterations };
            }

            self.drive_out_artificials(&mut tableau);
            tableau.restore_objective(cost);
        }

        let col_limit = tableau.art_start;
        match self.iterate(&mut tableau, col_limit, &mut iterations) {
            Step::Optimal => {}
            Step::Unbounded => return Run::Unbounded { iterations },
            Step::Limit => return Run::IterationLimit { iterations },
        }

        let x = tableau.values(self.tolerance);
        let duals = tableau.duals();
        Run::Optimal { x, duals, iterations }
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> Step {
        // Auxiliary objective: maximize -sum(artificials)
        let obj = tableau.obj_row();
        let width = tableau.width();
        tableau.data[obj] = vec![0.0; width];
        for j in tableau.art_start..tableau.art_start + tableau.n_artificial {
            tableau.data[obj][j] = -1.0;
        }

        // Price out the artificials that start in the basis
        for i in 0..tableau.n_rows {
            if tableau.basis[i] >= tableau.art_start {
                for j in 0..width {
                    tableau.data[obj][j] += tableau.data[i][j];
                }
            }
        }

        let limit = width - 1;
        let step = self.iterate(tableau, limit, iterations);
        debug!(iterations = *iterations, "phase 1 finished");
        step
    }

    /// Pivot zero-level artificials out of the basis so phase 2 cannot
    /// move them. Rows where no real column is nonzero are redundant.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        for i in 0..tableau.n_rows {
            if tableau.basis[i] < tableau.art_start {
                continue;
            }
            let col = (0..tableau.art_start).find(|&j| tableau.data[i][j].abs() > 1e-7);
            if let Some(col) = col {
                trace!(row = i, col, "driving artificial out of basis");
                tableau.pivot(i, col);
            }
        }
    }

    fn iterate(&self, tableau: &mut Tableau, col_limit: usize, iterations: &mut usize) -> Step {
        let rhs = tableau.rhs_col();
        let mut degenerate_run = 0;

        loop {
            if *iterations >= self.max_iterations {
                return Step::Limit;
            }
            let bland = degenerate_run >= self.degenerate_limit;
            let Some(col) = self.entering(tableau, col_limit, bland) else {
                return Step::Optimal;
            };
            let Some(row) = self.leaving(tableau, col) else {
                return Step::Unbounded;
            };

            if tableau.data[row][rhs] <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }

            trace!(row, col, bland, "pivot");
            tableau.pivot(row, col);
            *iterations += 1;
        }
    }

    /// Dantzig's rule (largest improvement), or Bland's rule (lowest index)
    /// once the basis has been stuck on a degenerate vertex.
    fn entering(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()];
        if bland {
            return (0..col_limit).find(|&j| obj[j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &v) in obj.iter().enumerate().take(col_limit) {
            if v > max_val {
                max_val = v;
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Minimum ratio test, ties broken by the lowest basic variable index
    fn leaving(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs = tableau.rhs_col();
        let mut best: Option<(f64, usize)> = None;

        for i in 0..tableau.n_rows {
            let a = tableau.data[i][col];
            if a <= self.tolerance {
                continue;
            }
            let ratio = (tableau.data[i][rhs] / a).max(0.0);
            best = match best {
                None => Some((ratio, i)),
                Some((r, _)) if ratio < r - self.tolerance => Some((ratio, i)),
                Some((r, k)) if ratio <= r + self.tolerance && tableau.basis[i] < tableau.basis[k] => {
                    Some((ratio, i))
                }
                keep => keep,
            };
        }

        best.map(|(_, i)| i)
    }
}

/// Dense tableau: `n_rows` constraint rows followed by the objective row.
///
/// Columns are the problem variables, one slack (or surplus) per row, the
/// artificials, and the right-hand side. The objective row holds `-d_j`
/// (negated reduced costs); a positive entry marks an improving column.
struct Tableau {
    data: Vec<Vec<f64>>,
    basis: Vec<usize>,
    n_vars: usize,
    n_rows: usize,
    art_start: usize,
    n_artificial: usize,
    /// Largest right-hand side magnitude, at least 1
    scale: f64,
}

impl Tableau {
    fn new(cost: &[f64], rows: &[&Inequality]) -> Self {
        let n_vars = cost.len();
        let n_rows = rows.len();
        let n_artificial = rows.iter().filter(|r| r.rhs < 0.0).count();
        let art_start = n_vars + n_rows;
        let width = art_start + n_artificial + 1;

        let mut data = vec![vec![0.0; width]; n_rows + 1];
        let mut basis = vec![0; n_rows];
        let mut next_artificial = art_start;

        for (i, row) in rows.iter().enumerate() {
            let slack = n_vars + i;
            if row.rhs < 0.0 {
                // Negate so the right-hand side is non-negative; the slack
                // becomes a surplus and an artificial enters the basis.
                for (j, &a) in row.coefficients.iter().enumerate() {
                    data[i][j] = -a;
                }
                data[i][slack] = -1.0;
                data[i][next_artificial] = 1.0;
                data[i][width - 1] = -row.rhs;
                basis[i] = next_artificial;
                next_artificial += 1;
            } else {
                data[i][..n_vars].copy_from_slice(&row.coefficients);
                data[i][slack] = 1.0;
                data[i][width - 1] = row.rhs;
                basis[i] = slack;
            }
        }

        for (j, &c) in cost.iter().enumerate() {
            data[n_rows][j] = -c;
        }

        let scale = rows.iter().map(|r| r.rhs.abs()).fold(1.0, f64::max);

        Self {
            data,
            basis,
            n_vars,
            n_rows,
            art_start,
            n_artificial,
            scale,
        }
    }

    fn width(&self) -> usize {
        self.data[0].len()
    }

    fn rhs_col(&self) -> usize {
        self.width() - 1
    }

    fn obj_row(&self) -> usize {
        self.n_rows
    }

    fn artificial_sum(&self) -> f64 {
        let rhs = self.rhs_col();
        (0..self.n_rows)
            .filter(|&i| self.basis[i] >= self.art_start)
            .map(|i| self.data[i][rhs])
            .sum()
    }

    fn restore_objective(&mut self, cost: &[f64]) {
        let obj = self.obj_row();
        let width = self.width();
        self.data[obj] = vec![0.0; width];
        for (j, &c) in cost.iter().enumerate() {
            self.data[obj][j] = -c;
        }

        for i in 0..self.n_rows {
            let factor = self.data[obj][self.basis[i]];
            if factor != 0.0 {
                for j in 0..width {
                    self.data[obj][j] -= factor * self.data[i][j];
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let width = self.width();
        self.basis[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..width {
            self.data[row][j] /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, r) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = r[col];
            if factor != 0.0 {
                for (v, p) in r.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }
    }

    fn values(&self, tolerance: f64) -> Vec<f64> {
        let rhs = self.rhs_col();
        let mut x = vec![0.0; self.n_vars];
        for i in 0..self.n_rows {
            let b = self.basis[i];
            if b < self.n_vars {
                // Round-off can leave a basic value a hair below zero
                x[b] = if self.data[i][rhs] < 0.0 && self.data[i][rhs] > -tolerance * 1e3 {
                    0.0
                } else {
                    self.data[i][rhs]
                };
            }
        }
        x
    }

    /// Shadow price of each row: the objective entry of its slack column.
    fn duals(&self) -> Vec<f64> {
        let obj = &self.data[self.obj_row()];
        (0..self.n_rows).map(|i| obj[self.n_vars + i]).collect()
    }
}

enum Run {
    Optimal {
        x: Vec<f64>,
        duals: Vec<f64>,
        iterations: usize,
    },
    Infeasible {
        iterations: usize,
    },
    Unbounded {
        iterations: usize,
    },
    IterationLimit {
        iterations: usize,
    },
}

enum Step {
    Optimal,
    Unbounded,
    Limit,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn clean(v: f64, tolerance: f64) -> f64 {
    if v.abs() < tolerance { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolveStatus;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize 3x + 2y as minimize -3x - 2y
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=-11
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![-3.0, -2.0]);
        problem.add_row("sum", vec![1.0, 1.0], 4.0);
        problem.add_row("x_max", vec![1.0, 0.0], 3.0);
        problem.add_row("y_max", vec![0.0, 1.0], 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Optimal);
        let x = solution.x.unwrap();
        assert!((x[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", x[0]);
        assert!((x[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", x[1]);
        assert!((solution.objective_value + 11.0).abs() < 1e-6, "obj = {}", solution.objective_value);
    }

    #[test]
    fn test_minimization_with_lower_bound_row() {
        // Minimize 2x + 3y
        //   x + y >= 4   (as -x - y <= -4)
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![2.0, 3.0]);
        problem.add_row("sum", vec![-1.0, -1.0], -4.0);
        problem.add_row("x_max", vec![1.0, 0.0], 3.0);
        problem.add_row("y_max", vec![0.0, 1.0], 3.0);

        let solution = Solver::new().solve(&problem);

        assert!(solution.success());
        let x = solution.x.unwrap();
        assert!((x[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", x[0]);
        assert!((x[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", x[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {}", solution.objective_value);
    }

    #[test]
    fn test_shadow_prices_and_binding_rows() {
        // Minimize x subject to x >= 5: raising the row's rhs (-5) by one
        // lowers the bound to 4 and the cost by one.
        let mut problem = LinearProgram::new(vars(&["x"]), vec![1.0]);
        problem.add_row("x_min", vec![-1.0], -5.0);
        problem.add_row("x_max", vec![1.0], 10.0);

        let solution = Solver::new().solve(&problem);

        assert!(solution.success());
        assert!((solution.objective_value - 5.0).abs() < 1e-9);
        let sp = solution.analysis.shadow_price("x_min").unwrap();
        assert!((sp + 1.0).abs() < 1e-9, "shadow price = {}", sp);
        assert_eq!(solution.analysis.shadow_price("x_max"), Some(0.0));
        assert!(solution.analysis.is_binding("x_min"));
        assert!(!solution.analysis.is_binding("x_max"));
    }

    #[test]
    fn test_infeasible_without_relaxable_rows() {
        // x >= 5, x <= 3
        let mut problem = LinearProgram::new(vars(&["x"]), vec![1.0]);
        problem.add_row("lower", vec![-1.0], -5.0);
        problem.add_row("upper", vec![1.0], 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(!solution.success());
        assert!(solution.x.is_none());
        assert!(solution.violations.is_empty());
    }

    #[test]
    fn test_infeasible_reports_violated_relaxable_rows() {
        // x + y >= 2 (hard), x + y <= 4 (hard), x >= 5 (relaxable)
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![1.0, 1.0]);
        problem.add_row("total_min", vec![-1.0, -1.0], -2.0);
        problem.add_row("total_max", vec![1.0, 1.0], 4.0);
        problem.add_relaxable_row("x_min", vec![-1.0, 0.0], -5.0);
        problem.add_relaxable_row("y_max", vec![0.0, 1.0], 10.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert_eq!(solution.violations.len(), 1);
        let v = &solution.violations[0];
        assert_eq!(v.constraint, "x_min");
        assert!(v.violation_amount > 0.0);
        let relaxed = solution.relaxed_x.unwrap();
        assert!((relaxed[0] + relaxed[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = LinearProgram::new(vars(&["x"]), vec![-1.0]);
        problem.add_row("x_min", vec![-1.0], -1.0);

        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolveStatus::Unbounded);
    }

    #[test]
    fn test_degenerate_problem_terminates() {
        // Beale's example cycles under plain Dantzig pricing
        let mut problem = LinearProgram::new(
            vars(&["x4", "x5", "x6", "x7"]),
            vec![-0.75, 20.0, -0.5, 6.0],
        );
        problem.add_row("r1", vec![0.25, -8.0, -1.0, 9.0], 0.0);
        problem.add_row("r2", vec![0.5, -12.0, -0.5, 3.0], 0.0);
        problem.add_row("r3", vec![0.0, 0.0, 1.0, 0.0], 1.0);

        let solution = Solver::new().with_degenerate_limit(3).solve(&problem);

        assert!(solution.success(), "status = {:?}", solution.status);
        assert!(
            (solution.objective_value + 1.25).abs() < 1e-6,
            "obj = {} (expected -1.25)",
            solution.objective_value
        );
    }

    #[test]
    fn test_redundant_equality_rows() {
        // x + y = 4 written twice as a pair of inequalities
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![1.0, 2.0]);
        for name in ["a", "b"] {
            problem.add_row(format!("{name}_min"), vec![-1.0, -1.0], -4.0);
            problem.add_row(format!("{name}_max"), vec![1.0, 1.0], 4.0);
        }

        let solution = Solver::new().solve(&problem);

        assert!(solution.success());
        let x = solution.x.unwrap();
        assert!((x[0] - 4.0).abs() < 1e-6 && x[1].abs() < 1e-6, "x = {:?}", x);
    }

    #[test]
    fn test_malformed_problem_is_an_error_status() {
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![1.0, 1.0]);
        problem.add_row("short", vec![1.0], 1.0);

        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolveStatus::Error);
        assert!(solution.message.contains("short"));
    }

    #[test]
    fn test_iteration_limit() {
        let mut problem = LinearProgram::new(vars(&["x", "y"]), vec![2.0, 3.0]);
        problem.add_row("sum", vec![-1.0, -1.0], -4.0);

        let solution = Solver::new().with_max_iterations(0).solve(&problem);
        assert_eq!(solution.status, SolveStatus::Error);
    }

    #[test]
    fn test_does_not_mutate_problem() {
        let mut problem = LinearProgram::new(vars(&["x"]), vec![1.0]);
        problem.add_row("x_min", vec![-1.0], -5.0);
        let before = format!("{:?}", problem);

        let _ = Solver::new().solve(&problem);
        assert_eq!(before, format!("{:?}", problem));
    }
}
