use std::fmt::Write as _;

use allocopt_solver::{ConstraintOp, Direction, Solution as LpSolution, SolutionStatus};

use crate::builder::{CanonicalConstraint, CanonicalModel};
use crate::goals::{GoalOutcome, LevelOutcome};
use crate::model::{GoalDirection, Mode};

/// Solved problem, mapped back onto the caller's names
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Solution {
    pub name: String,
    pub mode: Mode,
    pub status: SolutionStatus,
    pub feasible: bool,
    /// Optimum in the caller's direction. In goal mode, the achievement of
    /// the only goal when exactly one exists
    pub objective_value: Option<f64>,
    /// Empty unless `status` is `Optimal`
    pub variables: Vec<VariableValue>,
    /// Empty unless `status` is `Optimal`
    pub constraints: Vec<ConstraintReport>,
    pub goals: Vec<GoalReport>,
    pub levels: Vec<LevelOutcome>,
    /// Goal mode only: the assignment of the last priority level that solved
    /// when a later level did not. Never set for an `Optimal` solution.
    pub last_solved: Option<LastSolved>,
    pub iterations: usize,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableValue {
    pub id: String,
    pub name: String,
    pub value: f64,
}

/// Assignment carried over from an earlier goal level after a later one failed
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LastSolved {
    pub priority: u32,
    pub variables: Vec<VariableValue>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConstraintReport {
    pub id: String,
    pub name: String,
    pub sign: ConstraintOp,
    pub lhs: f64,
    pub rhs: f64,
    /// Unused capacity; the residual `rhs - lhs` for equalities
    pub slack: f64,
    pub satisfied: bool,
    /// Slack is zero within tolerance
    pub binding: bool,
    /// Objective change per unit increase of `rhs` (single-objective only)
    pub shadow_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GoalState {
    /// Deviation is zero or favourable
    Met,
    /// Solved, but short of the target
    Missed,
    /// A more important level failed before this goal was considered
    Unattained,
}

impl GoalState {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalState::Met => "met",
            GoalState::Missed => "missed",
            GoalState::Unattained => "unattained",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GoalReport {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub direction: GoalDirection,
    pub target: f64,
    /// `Σ coeff·x` at the reported assignment; absent for unattained goals
    pub achievement: Option<f64>,
    /// `target - achievement` for max goals, `achievement - target` for min goals
    pub deviation: Option<f64>,
    pub state: GoalState,
}

/// What the solver side produced for a model
#[derive(Debug, Clone)]
pub enum RawOutcome {
    Single(LpSolution),
    Goals(GoalOutcome),
}

/// Map a raw outcome back onto `model`'s names and render the summary.
///
/// Magnitudes within `tolerance` (relative to the size of the quantity
/// involved) are reported as exactly zero.
pub fn assemble(model: &CanonicalModel, raw: RawOutcome, tolerance: f64) -> Solution {
    let mut solution = match raw {
        RawOutcome::Single(lp) => assemble_single(model, lp, tolerance),
        RawOutcome::Goals(outcome) => assemble_goals(model, outcome, tolerance),
    };
    solution.summary = render_summary(model, &solution);
    solution
}

fn assemble_single(model: &CanonicalModel, lp: LpSolution, tolerance: f64) -> Solution {
    let sign = model.objective_sign();
    let feasible = lp.is_optimal();

    let (objective_value, variables, constraints) = if feasible {
        let objective = lp.objective_value.map(|v| snap(sign * v, 1.0, tolerance));
        let shadow_prices: Vec<Option<f64>> = (0..model.constraints.len())
            .map(|i| lp.analysis.shadow_prices.get(i).map(|p| snap(sign * p, 1.0, tolerance)))
            .collect();
        let constraints = model
            .constraints
            .iter()
            .zip(shadow_prices)
            .map(|(c, price)| constraint_report(c, &lp.values, price, tolerance))
            .collect();
        (objective, variable_values(model, &lp.values), constraints)
    } else {
        (None, Vec::new(), Vec::new())
    };

    Solution {
        name: model.name.clone(),
        mode: model.mode,
        status: lp.status,
        feasible,
        objective_value,
        variables,
        constraints,
        goals: Vec::new(),
        levels: Vec::new(),
        last_solved: None,
        iterations: lp.iterations,
        summary: String::new(),
    }
}

fn assemble_goals(model: &CanonicalModel, outcome: GoalOutcome, tolerance: f64) -> Solution {
    let status = outcome.status();
    let iterations = outcome.iterations();
    let values = outcome.assignment.as_deref();

    let goals: Vec<GoalReport> = model
        .goals
        .iter()
        .map(|goal| {
            let unattained = outcome.broken_at.is_some_and(|p| goal.priority >= p);
            let achievement = values.filter(|_| !unattained).map(|x| {
                let scale = goal.target.abs().max(magnitude(&goal.coefficients, x));
                let value = goal.achievement(x);
                // Report an achievement that sits on the target as the target itself
                if (value - goal.target).abs() <= tolerance * scale.max(1.0) {
                    goal.target
                } else {
                    value
                }
            });
            let deviation = achievement.map(|a| goal.deviation(a));
            let state = match deviation {
                Some(d) if d <= 0.0 => GoalState::Met,
                Some(_) => GoalState::Missed,
                None => GoalState::Unattained,
            };
            GoalReport {
                id: goal.id.clone(),
                name: goal.name.clone(),
                priority: goal.priority,
                direction: goal.direction,
                target: goal.target,
                achievement,
                deviation,
                state,
            }
        })
        .collect();

    let objective_value = match goals.as_slice() {
        [only] => only.achievement,
        _ => None,
    };

    let complete = outcome.broken_at.is_none();
    let (variables, constraints) = match values {
        Some(x) if complete => (
            variable_values(model, x),
            model
                .constraints
                .iter()
                .map(|c| constraint_report(c, x, None, tolerance))
                .collect(),
        ),
        _ => (Vec::new(), Vec::new()),
    };
    let last_solved = match (values, outcome.levels.iter().rev().find(|l| l.status == SolutionStatus::Optimal)) {
        (Some(x), Some(level)) if !complete => Some(LastSolved {
            priority: level.priority,
            variables: variable_values(model, x),
        }),
        _ => None,
    };

    Solution {
        name: model.name.clone(),
        mode: model.mode,
        status,
        feasible: complete,
        objective_value,
        variables,
        constraints,
        goals,
        levels: outcome.levels,
        last_solved,
        iterations,
        summary: String::new(),
    }
}

fn variable_values(model: &CanonicalModel, values: &[f64]) -> Vec<VariableValue> {
    model
        .variables
        .iter()
        .zip(values)
        .map(|(v, &value)| VariableValue {
            id: v.id.clone(),
            name: v.name.clone(),
            // Already snapped onto their bounds by the solver; only drop negative zero
            value: if value == 0.0 { 0.0 } else { value },
        })
        .collect()
}

fn constraint_report(c: &CanonicalConstraint, values: &[f64], shadow_price: Option<f64>, tolerance: f64) -> ConstraintReport {
    let lhs = c.lhs(values);
    let raw_slack = match c.sign {
        ConstraintOp::Le | ConstraintOp::Eq => c.rhs - lhs,
        ConstraintOp::Ge => lhs - c.rhs,
    };
    let scale = c.rhs.abs().max(magnitude(&c.coefficients, values));
    let slack = snap(raw_slack, scale, tolerance);
    let satisfied = match c.sign {
        ConstraintOp::Eq => slack == 0.0,
        ConstraintOp::Le | ConstraintOp::Ge => slack >= 0.0,
    };

    ConstraintReport {
        id: c.id.clone(),
        name: c.name.clone(),
        sign: c.sign,
        lhs,
        rhs: c.rhs,
        slack,
        satisfied,
        binding: slack == 0.0,
        shadow_price,
    }
}

/// Largest single term `|a_j x_j|` of a row
fn magnitude(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(values)
        .fold(0.0_f64, |acc, (a, x)| acc.max((a * x).abs()))
}

/// Zero out `value` when it is within `tolerance` relative to `scale`
fn snap(value: f64, scale: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance * scale.max(1.0) { 0.0 } else { value }
}

/// Fixed-precision rendering; never prints negative zero
fn num(value: f64) -> String {
    let rounded = (value * 1e4).round() / 1e4;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.4}")
}

fn render_summary(model: &CanonicalModel, solution: &Solution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", model.name, model.mode.as_str());
    let verdict = if solution.feasible { "feasible" } else { "not feasible" };
    let _ = writeln!(out, "Status: {} ({verdict})", solution.status.as_str());

    match model.mode {
        Mode::ProfitMax | Mode::CostMin => {
            if let Some(value) = solution.objective_value {
                let label = if model.mode == Mode::ProfitMax { "Total profit" } else { "Total cost" };
                let direction = match model.direction {
                    Some(Direction::Minimize) => "minimize",
                    _ => "maximize",
                };
                let _ = writeln!(out, "{label} ({direction}): {}", num(value));
            } else {
                let reason = match solution.status {
                    SolutionStatus::Infeasible => "No assignment satisfies every constraint.",
                    SolutionStatus::Unbounded => "The objective can be improved without limit.",
                    SolutionStatus::Unresolved => "The solver stopped at its pivot limit without a verdict.",
                    SolutionStatus::Cancelled => "The solve was cancelled.",
                    SolutionStatus::Optimal => "",
                };
                let _ = writeln!(out, "{reason}");
            }
        }
        Mode::GoalProgramming => {
            if let Some(level) = solution.levels.iter().find(|l| l.status != SolutionStatus::Optimal) {
                let _ = writeln!(
                    out,
                    "Priority {} could not be solved ({}); it and every later priority are unattained.",
                    level.priority,
                    level.status.as_str()
                );
            }
            let _ = writeln!(out, "Goals:");
            for g in &solution.goals {
                let direction = match g.direction {
                    GoalDirection::Max => ">=",
                    GoalDirection::Min => "<=",
                };
                let achievement = g.achievement.map_or_else(|| "-".to_string(), num);
                let deviation = g.deviation.map_or_else(|| "-".to_string(), num);
                let _ = writeln!(
                    out,
                    "  P{} {} ({direction} {}): achievement {achievement}, deviation {deviation}, {}",
                    g.priority,
                    g.name,
                    num(g.target),
                    g.state.as_str()
                );
            }
        }
    }

    if !solution.variables.is_empty() {
        let _ = writeln!(out, "Variables:");
        for v in &solution.variables {
            let _ = writeln!(out, "  {}: {}", v.name, num(v.value));
        }
    }

    if let Some(last) = &solution.last_solved {
        let _ = writeln!(out, "Last solved assignment (priority {}):", last.priority);
        for v in &last.variables {
            let _ = writeln!(out, "  {}: {}", v.name, num(v.value));
        }
    }

    if !solution.constraints.is_empty() {
        let binding: Vec<&str> = solution
            .constraints
            .iter()
            .filter(|c| c.binding)
            .map(|c| c.name.as_str())
            .collect();
        if binding.is_empty() {
            let _ = writeln!(out, "Binding constraints: none");
        } else {
            let _ = writeln!(out, "Binding constraints: {}", binding.join(", "));
        }
        for c in solution.constraints.iter().filter(|c| !c.satisfied) {
            let _ = writeln!(out, "Violated: {} (slack {})", c.name, num(c.slack));
        }
    }

    out
}
