use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::problem::{ConstraintOp, LpProblem, ProblemError};
use crate::solution::{Analysis, Solution, SolutionStatus};

/// Consecutive zero-length pivots tolerated before pricing switches to Bland's rule
const DEGENERATE_RUN: usize = 50;

/// Bounded-variable simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots before giving up; `None` derives the cap from problem size
    max_iterations: Option<usize>,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Checked once per iteration; raising it aborts the solve
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tolerance: 1e-9,
            cancel: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Pivot cap for a tableau with `rows` constraints and `cols` columns.
    pub fn iteration_cap(&self, rows: usize, cols: usize) -> usize {
        self.max_iterations.unwrap_or(10_000 + 50 * (rows + cols))
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Solve the LP problem using the two-phase bounded simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, ProblemError> {
        problem.check()?;

        let mut tableau = Tableau::build(problem, self.tolerance);
        let cap = self.iteration_cap(problem.num_constraints(), tableau.n_cols);
        let mut iterations = 0;

        tracing::debug!(
            rows = problem.num_constraints(),
            cols = tableau.n_cols,
            artificials = tableau.n_artificial,
            cap,
            "starting simplex"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            let costs = tableau.phase1_costs();
            match self.optimize(&mut tableau, &costs, Phase::One, &mut iterations, cap) {
                SimplexResult::Optimal => {}
                // Phase 1 is bounded by zero; treat a runaway column as infeasible
                SimplexResult::Unbounded => {
                    return Ok(Solution::without_values(SolutionStatus::Infeasible, iterations));
                }
                SimplexResult::Halted(status) => return Ok(Solution::without_values(status, iterations)),
            }

            let infeasibility = tableau.artificial_sum();
            let allowed = self.tolerance * tableau.rhs_scale * (problem.num_constraints().max(1) as f64);
            if infeasibility > allowed {
                tracing::debug!(infeasibility, iterations, "phase 1 left residual infeasibility");
                return Ok(Solution::without_values(SolutionStatus::Infeasible, iterations));
            }
            tableau.retire_artificials();
            tracing::debug!(iterations, "phase 1 found a feasible basis");
        }

        // Phase 2: Optimize
        let costs = tableau.phase2_costs(problem);
        match self.optimize(&mut tableau, &costs, Phase::Two, &mut iterations, cap) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => {
                tracing::debug!(iterations, "objective is unbounded");
                return Ok(Solution::without_values(SolutionStatus::Unbounded, iterations));
            }
            SimplexResult::Halted(status) => return Ok(Solution::without_values(status, iterations)),
        }

        let solution = self.extract_solution(&tableau, problem, iterations);
        tracing::debug!(iterations, objective = solution.objective_value, "simplex finished");
        Ok(solution)
    }

    fn optimize(
        &self,
        tableau: &mut Tableau,
        costs: &[f64],
        phase: Phase,
        iterations: &mut usize,
        cap: usize,
    ) -> SimplexResult {
        tableau.price(costs);
        let cost_scale = costs.iter().fold(1.0_f64, |acc, c| acc.max(c.abs()));
        let reduced_cost_tol = self.tolerance * cost_scale;
        let mut pricing = Pricing::Dantzig;
        let mut degenerate = 0;

        loop {
            if self.cancelled() {
                return SimplexResult::Halted(SolutionStatus::Cancelled);
            }
            let Some((col, direction)) = tableau.entering(reduced_cost_tol, pricing) else {
                return SimplexResult::Optimal;
            };
            if *iterations >= cap {
                tracing::debug!(cap, "pivot cap reached");
                return SimplexResult::Halted(SolutionStatus::Unresolved);
            }

            match tableau.ratio_test(col, direction, self.tolerance, pricing) {
                Move::Unbounded => return SimplexResult::Unbounded,
                Move::Flip => {
                    tracing::trace!(phase = phase.as_str(), entering = col, "bound flip");
                    tableau.flip(col);
                    degenerate = 0;
                    pricing = Pricing::Dantzig;
                }
                Move::Pivot { row, to_upper, step } => {
                    tracing::trace!(
                        phase = phase.as_str(),
                        entering = col,
                        leaving = tableau.basic_vars[row],
                        row,
                        step,
                        "pivot"
                    );
                    tableau.pivot(row, col, to_upper);
                    if step > self.tolerance {
                        degenerate = 0;
                        pricing = Pricing::Dantzig;
                    } else {
                        degenerate += 1;
                        if degenerate == DEGENERATE_RUN {
                            tracing::debug!(phase = phase.as_str(), iterations = *iterations, "switching to Bland's rule");
                            pricing = Pricing::Bland;
                        }
                    }
                }
            }
            *iterations += 1;
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();

        // Extract variable values, snapping values within tolerance of a bound onto it
        let values: Vec<f64> = (0..n_vars)
            .map(|j| {
                let x = tableau.values[j];
                let lower = tableau.lower[j];
                if (x - lower).abs() <= self.tolerance * lower.abs().max(1.0) {
                    return lower;
                }
                match tableau.upper[j] {
                    Some(u) if (x - u).abs() <= self.tolerance * u.abs().max(1.0) => u,
                    _ => x,
                }
            })
            .collect();

        // Calculate objective value
        let objective_value: f64 = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        let analysis = self.analyze(tableau, problem);

        Solution::optimal(values, objective_value, iterations, analysis)
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem) -> Analysis {
        let n_vars = problem.num_variables();
        let sign = problem.objective.direction.sign();

        // The reduced cost of a row's slack column is that row's dual value
        let shadow_prices = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let row_sign = if c.op == ConstraintOp::Ge { -1.0 } else { 1.0 };
                let value = tableau.objective[n_vars + i] * row_sign * sign;
                if value.abs() < self.tolerance { 0.0 } else { value }
            })
            .collect();

        let basic: Vec<bool> = (0..n_vars).map(|j| tableau.basis_row[j].is_some()).collect();
        let reduced_costs = (0..n_vars)
            .map(|j| {
                let rc = if basic[j] { 0.0 } else { -tableau.objective[j] * sign };
                if rc.abs() < self.tolerance { 0.0 } else { rc }
            })
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            basic,
        }
    }
}

/// Dense bounded-variable tableau.
///
/// Columns are laid out as `[structural | slack (one per row) | artificial]`
/// followed by the transformed right-hand side `B^-1 b`. Every row is an
/// equality once its slack is added: `<=` rows take a slack in `[0, inf)`,
/// `>=` rows are negated first, and `=` rows take a slack fixed at `[0, 0]`.
struct Tableau {
    data: Vec<Vec<f64>>,
    /// Reduced costs in z-row form: a negative entry improves the objective
    /// when its column increases, a positive one when it decreases.
    objective: Vec<f64>,
    basic_vars: Vec<usize>,
    basis_row: Vec<Option<usize>>,
    lower: Vec<f64>,
    upper: Vec<Option<f64>>,
    /// Nonbasic columns sit at their upper bound when set, lower otherwise
    at_upper: Vec<bool>,
    values: Vec<f64>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    n_cols: usize,
    rhs_scale: f64,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Halted(SolutionStatus),
}

enum Move {
    /// The entering column runs into its own opposite bound first
    Flip,
    Pivot { row: usize, to_upper: bool, step: f64 },
    Unbounded,
}

/// Entering/leaving selection rule
#[derive(Clone, Copy, PartialEq, Eq)]
enum Pricing {
    /// Largest improving reduced cost, lowest index on ties
    Dantzig,
    /// Lowest improving index and lowest leaving index; cannot cycle
    Bland,
}

#[derive(Clone, Copy)]
enum Phase {
    One,
    Two,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::One => "1",
            Phase::Two => "2",
        }
    }
}

impl Tableau {
    fn build(problem: &LpProblem, tolerance: f64) -> Self {
        let n_vars = problem.num_variables();
        let n_rows = problem.num_constraints();

        // Orient every row so it reads `a x + s = b` and work out which rows
        // cannot start with their slack basic (structurals at their lower bounds).
        let mut oriented = Vec::with_capacity(n_rows);
        let mut n_artificial = 0;
        for c in &problem.constraints {
            let flip = if c.op == ConstraintOp::Ge { -1.0 } else { 1.0 };
            let coefficients: Vec<f64> = c.coefficients.iter().map(|a| flip * a).collect();
            let rhs = flip * c.rhs;
            let start: f64 = coefficients
                .iter()
                .zip(&problem.bounds)
                .map(|(a, b)| a * b.lower)
                .sum();
            let residual = rhs - start;
            let slack_tol = tolerance * rhs.abs().max(1.0);
            let slack_fits = residual >= -slack_tol && (c.op != ConstraintOp::Eq || residual <= slack_tol);
            let artificial = if slack_fits {
                None
            } else {
                n_artificial += 1;
                Some(if residual > 0.0 { 1.0 } else { -1.0 })
            };
            oriented.push((coefficients, rhs, artificial));
        }

        let n_slack = n_rows;
        let n_cols = n_vars + n_slack + n_artificial;
        let rhs_col = n_cols;

        let mut lower = Vec::with_capacity(n_cols);
        let mut upper = Vec::with_capacity(n_cols);
        for b in &problem.bounds {
            lower.push(b.lower);
            upper.push(b.upper);
        }
        for c in &problem.constraints {
            lower.push(0.0);
            upper.push(if c.op == ConstraintOp::Eq { Some(0.0) } else { None });
        }
        for _ in 0..n_artificial {
            lower.push(0.0);
            upper.push(None);
        }

        let mut data = vec![vec![0.0; n_cols + 1]; n_rows];
        let mut basic_vars = vec![0; n_rows];
        let mut basis_row = vec![None; n_cols];
        let mut artificial_idx = n_vars + n_slack;
        let mut rhs_scale = 1.0_f64;

        for (i, (coefficients, rhs, artificial)) in oriented.into_iter().enumerate() {
            let row = &mut data[i];
            row[..n_vars].copy_from_slice(&coefficients);
            row[n_vars + i] = 1.0;
            row[rhs_col] = rhs;
            rhs_scale = rhs_scale.max(rhs.abs());

            match artificial {
                None => {
                    basic_vars[i] = n_vars + i;
                    basis_row[n_vars + i] = Some(i);
                }
                Some(sign) => {
                    row[artificial_idx] = sign;
                    // B is diagonal at the start, so B^-1 just rescales the row
                    if sign < 0.0 {
                        for value in row.iter_mut() {
                            *value = -*value;
                        }
                    }
                    basic_vars[i] = artificial_idx;
                    basis_row[artificial_idx] = Some(i);
                    artificial_idx += 1;
                }
            }
        }

        let mut tableau = Tableau {
            data,
            objective: vec![0.0; n_cols],
            basic_vars,
            basis_row,
            lower,
            upper,
            at_upper: vec![false; n_cols],
            values: vec![0.0; n_cols],
            n_vars,
            n_slack,
            n_artificial,
            n_cols,
            rhs_scale,
        };
        tableau.refresh_values();
        tableau
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    /// Phase 1 maximizes the negated sum of artificials
    fn phase1_costs(&self) -> Vec<f64> {
        let mut costs = vec![0.0; self.n_cols];
        for cost in &mut costs[self.artificial_start()..] {
            *cost = -1.0;
        }
        costs
    }

    /// Phase 2 maximizes the real objective, negated for minimization
    fn phase2_costs(&self, problem: &LpProblem) -> Vec<f64> {
        let sign = problem.objective.direction.sign();
        let mut costs = vec![0.0; self.n_cols];
        for (cost, c) in costs.iter_mut().zip(&problem.objective.coefficients) {
            *cost = sign * c;
        }
        costs
    }

    fn artificial_sum(&self) -> f64 {
        self.values[self.artificial_start()..].iter().sum()
    }

    /// Pin every artificial column to zero so none can re-enter in phase 2.
    /// Artificials still basic at zero leave on the first pivot touching their row.
    fn retire_artificials(&mut self) {
        for j in self.artificial_start()..self.n_cols {
            self.upper[j] = Some(0.0);
            self.at_upper[j] = false;
        }
        self.refresh_values();
    }

    /// Recompute the reduced-cost row for `costs` from the current basis.
    fn price(&mut self, costs: &[f64]) {
        for j in 0..self.n_cols {
            if self.basis_row[j].is_some() {
                self.objective[j] = 0.0;
                continue;
            }
            let mut r = -costs[j];
            for (i, &basic) in self.basic_vars.iter().enumerate() {
                r += costs[basic] * self.data[i][j];
            }
            self.objective[j] = r;
        }
    }

    /// The nonbasic column with an improving reduced cost that still has room
    /// to move. Dantzig takes the largest (lowest index on ties), Bland the
    /// first one found.
    fn entering(&self, tolerance: f64, pricing: Pricing) -> Option<(usize, f64)> {
        let mut best = None;
        let mut best_score = tolerance;

        for j in 0..self.n_cols {
            if self.basis_row[j].is_some() {
                continue;
            }
            let r = self.objective[j];
            let has_room = self.upper[j].is_none_or(|u| u > self.lower[j]);
            let (score, direction) = if r < 0.0 && !self.at_upper[j] && has_room {
                (-r, 1.0)
            } else if r > 0.0 && self.at_upper[j] && has_room {
                (r, -1.0)
            } else {
                continue;
            };
            if score > best_score {
                best_score = score;
                best = Some((j, direction));
                if pricing == Pricing::Bland {
                    break;
                }
            }
        }

        best
    }

    /// Bounded ratio test for moving column `col` in `direction`.
    /// Leaving ties go to the lowest row index (lowest basic column under
    /// Bland's rule); a bound flip wins ties with rows.
    fn ratio_test(&self, col: usize, direction: f64, tolerance: f64, pricing: Pricing) -> Move {
        let col_scale = self
            .data
            .iter()
            .fold(1.0_f64, |acc, row| acc.max(row[col].abs()));
        let pivot_tol = tolerance * col_scale;

        let mut best_step = f64::INFINITY;
        let mut leaving = None;

        for (i, row) in self.data.iter().enumerate() {
            // Basic variable i changes by -alpha per unit step of the entering column
            let alpha = direction * row[col];
            let basic = self.basic_vars[i];
            let (step, to_upper) = if alpha > pivot_tol {
                ((self.values[basic] - self.lower[basic]).max(0.0) / alpha, false)
            } else if alpha < -pivot_tol {
                match self.upper[basic] {
                    Some(u) => ((u - self.values[basic]).max(0.0) / -alpha, true),
                    None => continue,
                }
            } else {
                continue;
            };
            let replaces = match (pricing, leaving) {
                (Pricing::Bland, Some((r, _))) if (step - best_step).abs() <= tolerance => basic < self.basic_vars[r],
                _ => step < best_step,
            };
            if replaces {
                best_step = best_step.min(step);
                leaving = Some((i, to_upper));
            }
        }

        let flip = self.upper[col].map(|u| u - self.lower[col]);
        match (leaving, flip) {
            (_, Some(width)) if width <= best_step => Move::Flip,
            (Some((row, to_upper)), _) => Move::Pivot {
                row,
                to_upper,
                step: best_step,
            },
            (None, _) => Move::Unbounded,
        }
    }

    fn flip(&mut self, col: usize) {
        self.at_upper[col] = !self.at_upper[col];
        self.refresh_values();
    }

    fn pivot(&mut self, row: usize, col: usize, leaving_to_upper: bool) {
        let width = self.n_cols + 1;
        let leaving = self.basic_vars[row];

        // Update basic variable
        self.basic_vars[row] = col;
        self.basis_row[col] = Some(row);
        self.basis_row[leaving] = None;
        self.at_upper[leaving] = leaving_to_upper;
        self.at_upper[col] = false;

        // Scale pivot row
        let pivot_val = self.data[row][col];
        for j in 0..width {
            self.data[row][j] /= pivot_val;
        }
        let pivot_row = self.data[row].clone();

        // Eliminate column in other rows
        for i in 0..self.data.len() {
            if i == row {
                continue;
            }
            let factor = self.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..width {
                self.data[i][j] -= factor * pivot_row[j];
            }
            self.data[i][col] = 0.0;
        }

        let factor = self.objective[col];
        for j in 0..self.n_cols {
            self.objective[j] -= factor * pivot_row[j];
        }
        self.objective[col] = 0.0;

        self.refresh_values();
    }

    /// Nonbasic columns sit on a bound; basic ones are `B^-1 b - B^-1 N x_N`.
    fn refresh_values(&mut self) {
        for j in 0..self.n_cols {
            if self.basis_row[j].is_none() {
                self.values[j] = match (self.at_upper[j], self.upper[j]) {
                    (true, Some(u)) => u,
                    _ => self.lower[j],
                };
            }
        }
        for (i, row) in self.data.iter().enumerate() {
            let mut value = row[self.n_cols];
            for j in 0..self.n_cols {
                if self.basis_row[j].is_none() && self.values[j] != 0.0 {
                    value -= row[j] * self.values[j];
                }
            }
            self.values[self.basic_vars[i]] = value;
        }
    }
}
