//! Lexicographic (preemptive) goal programming on top of the simplex core.
//!
//! Each priority level adds its goals as `Σ coeff·x + n − p = target` rows,
//! minimizes the penalized deviations of that level only, then freezes the
//! minimum it reached as an equality row so later levels cannot trade it away.

use allocopt_solver::{Bounds, ConstraintOp, Direction, LpProblem, ProblemError, SolutionStatus, Solver};

use crate::builder::{CanonicalGoal, CanonicalModel};
use crate::model::GoalDirection;

/// How the penalized deviations of goals sharing a priority level are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LevelWeighting {
    /// Plain sum of deviations
    #[default]
    Equal,
    /// Each deviation divided by `|target|` (weight 1 for a zero target), so
    /// goals of different magnitude compete in relative terms
    RelativeToTarget,
}

impl LevelWeighting {
    fn weight(self, goal: &CanonicalGoal) -> f64 {
        match self {
            LevelWeighting::Equal => 1.0,
            LevelWeighting::RelativeToTarget if goal.target != 0.0 => 1.0 / goal.target.abs(),
            LevelWeighting::RelativeToTarget => 1.0,
        }
    }
}

/// Outcome of one priority level
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LevelOutcome {
    pub priority: u32,
    pub status: SolutionStatus,
    /// Minimized (weighted) sum of the level's penalized deviations
    pub achieved: Option<f64>,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalOutcome {
    /// Levels that were attempted, most important first
    pub levels: Vec<LevelOutcome>,
    /// Structural variable values from the last level that solved
    pub assignment: Option<Vec<f64>>,
    /// Priority of the level that failed, if any
    pub broken_at: Option<u32>,
}

impl GoalOutcome {
    /// `Optimal` when every level solved, otherwise the failing level's status
    pub fn status(&self) -> SolutionStatus {
        self.levels
            .iter()
            .map(|l| l.status)
            .find(|s| *s != SolutionStatus::Optimal)
            .unwrap_or(SolutionStatus::Optimal)
    }

    pub fn iterations(&self) -> usize {
        self.levels.iter().map(|l| l.iterations).sum()
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    bounds: Bounds,
}

#[derive(Debug, Clone)]
struct Row {
    name: String,
    terms: Vec<(usize, f64)>,
    op: ConstraintOp,
    rhs: f64,
}

/// Columns and rows carried forward from one priority level to the next.
#[derive(Debug, Clone)]
struct Accumulated {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

/// Column indices of a goal's under- (`n`) and over-achievement (`p`) deviations
#[derive(Debug, Clone, Copy)]
struct DeviationPair {
    under: usize,
    over: usize,
}

impl Accumulated {
    /// Structural columns plus every ordinary constraint of the model
    fn from_model(model: &CanonicalModel) -> Self {
        let columns = model
            .variables
            .iter()
            .map(|v| Column {
                name: v.name.clone(),
                bounds: v.bounds,
            })
            .collect();
        let rows = model
            .constraints
            .iter()
            .map(|c| Row {
                name: c.name.clone(),
                terms: sparse(&c.coefficients),
                op: c.sign,
                rhs: c.rhs,
            })
            .collect();
        Self { columns, rows }
    }

    fn push_column(&mut self, name: String) -> usize {
        self.columns.push(Column {
            name,
            bounds: Bounds::non_negative(),
        });
        self.columns.len() - 1
    }

    fn add_goal(&mut self, goal: &CanonicalGoal) -> DeviationPair {
        let pair = DeviationPair {
            under: self.push_column(format!("{} (under)", goal.name)),
            over: self.push_column(format!("{} (over)", goal.name)),
        };
        let mut terms = sparse(&goal.coefficients);
        terms.push((pair.under, 1.0));
        terms.push((pair.over, -1.0));
        self.rows.push(Row {
            name: goal.name.clone(),
            terms,
            op: ConstraintOp::Eq,
            rhs: goal.target,
        });
        pair
    }

    fn freeze(&mut self, priority: u32, penalty: &[(usize, f64)], achieved: f64) {
        self.rows.push(Row {
            name: format!("priority {priority} frozen"),
            terms: penalty.to_vec(),
            op: ConstraintOp::Eq,
            rhs: achieved,
        });
    }

    /// Dense LP minimizing `penalty` over everything accumulated so far
    fn to_lp(&self, penalty: &[(usize, f64)]) -> LpProblem {
        let n = self.columns.len();
        let mut lp = LpProblem::new(self.columns.iter().map(|c| c.name.clone()).collect());
        lp.bounds = self.columns.iter().map(|c| c.bounds).collect();

        let mut objective = vec![0.0; n];
        for &(j, w) in penalty {
            objective[j] += w;
        }
        lp.set_objective(objective, Direction::Minimize);

        for row in &self.rows {
            let mut coefficients = vec![0.0; n];
            for &(j, a) in &row.terms {
                coefficients[j] += a;
            }
            lp.add_constraint(row.name.clone(), coefficients, row.op, row.rhs);
        }
        lp
    }
}

fn sparse(coefficients: &[f64]) -> Vec<(usize, f64)> {
    coefficients
        .iter()
        .enumerate()
        .filter(|(_, a)| **a != 0.0)
        .map(|(j, a)| (j, *a))
        .collect()
}

/// Solve the model's goals level by level, most important priority first.
pub fn solve_goals(
    model: &CanonicalModel,
    solver: &Solver,
    weighting: LevelWeighting,
) -> Result<GoalOutcome, ProblemError> {
    let n_vars = model.num_variables();
    let mut program = Accumulated::from_model(model);
    let mut levels = Vec::new();
    let mut assignment = None;
    let mut broken_at = None;

    for (priority, members) in model.priority_levels() {
        let mut penalty = Vec::with_capacity(members.len());
        let mut scale = 1.0_f64;
        for &g in &members {
            let goal = &model.goals[g];
            let pair = program.add_goal(goal);
            let bad = match goal.direction {
                GoalDirection::Max => pair.under,
                GoalDirection::Min => pair.over,
            };
            let weight = weighting.weight(goal);
            scale = scale.max(goal.target.abs() * weight);
            penalty.push((bad, weight));
        }

        let solution = solver.solve(&program.to_lp(&penalty))?;
        tracing::debug!(
            priority,
            goals = members.len(),
            status = solution.status.as_str(),
            iterations = solution.iterations,
            achieved = solution.objective_value,
            "solved goal level"
        );

        if !solution.is_optimal() {
            levels.push(LevelOutcome {
                priority,
                status: solution.status,
                achieved: None,
                iterations: solution.iterations,
            });
            broken_at = Some(priority);
            break;
        }

        let mut achieved = solution.objective_value.unwrap_or(0.0);
        if achieved.abs() <= solver.tolerance() * scale {
            achieved = 0.0;
        }
        program.freeze(priority, &penalty, achieved);
        assignment = Some(solution.values.iter().take(n_vars).copied().collect());
        levels.push(LevelOutcome {
            priority,
            status: SolutionStatus::Optimal,
            achieved: Some(achieved),
            iterations: solution.iterations,
        });
    }

    Ok(GoalOutcome {
        levels,
        assignment,
        broken_at,
    })
}
