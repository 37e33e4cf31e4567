use std::collections::HashMap;

use allocopt_solver::{Bounds, ConstraintOp, Direction, LpProblem, ProblemError};
use thiserror::Error;

use crate::model::{GoalDirection, Mode, Problem, Term};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Problem declares no variables")]
    EmptyVariables,
    #[error("Problem declares no constraints")]
    EmptyConstraints,
    #[error("Goal programming problem declares no goals")]
    NoGoals,
    #[error("Goals are only allowed in goal_programming mode ({0} given)")]
    GoalsOutsideGoalMode(usize),
    #[error("Variable '{id}' has lower bound {lower} above upper bound {upper}")]
    BadBounds { id: String, lower: f64, upper: f64 },
    #[error("Duplicate variable id: {0}")]
    DuplicateVariable(String),
    #[error("'{row}' references unknown variable '{variable}'")]
    DanglingReference { row: String, variable: String },
    #[error("'{row}' lists variable '{variable}' more than once")]
    DuplicateTerm { row: String, variable: String },
    #[error("'{0}' has only zero coefficients")]
    ZeroRow(String),
    #[error("Goal '{0}' has priority 0; priorities start at 1")]
    InvalidPriority(String),
    #[error("Non-finite number in {0}")]
    NonFinite(String),
    #[error(transparent)]
    Lp(#[from] ProblemError),
}

/// A decision variable after validation
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalVariable {
    pub id: String,
    pub name: String,
    pub bounds: Bounds,
}

/// A constraint row over the dense variable index
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalConstraint {
    pub id: String,
    pub name: String,
    pub coefficients: Vec<f64>,
    pub sign: ConstraintOp,
    pub rhs: f64,
}

impl CanonicalConstraint {
    pub fn lhs(&self, values: &[f64]) -> f64 {
        dot(&self.coefficients, values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalGoal {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub direction: GoalDirection,
    pub target: f64,
    pub coefficients: Vec<f64>,
}

impl CanonicalGoal {
    /// `Σ coeff·x` at `values`
    pub fn achievement(&self, values: &[f64]) -> f64 {
        dot(&self.coefficients, values)
    }

    /// Signed distance from the target; positive means the goal fell short.
    pub fn deviation(&self, achievement: f64) -> f64 {
        match self.direction {
            GoalDirection::Max => self.target - achievement,
            GoalDirection::Min => achievement - self.target,
        }
    }
}

/// Validated, index-based form of a [`Problem`]
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalModel {
    pub name: String,
    pub mode: Mode,
    /// Objective direction the caller asked for; `None` in goal mode
    pub direction: Option<Direction>,
    pub variables: Vec<CanonicalVariable>,
    pub constraints: Vec<CanonicalConstraint>,
    /// Objective coefficients in maximize convention (costs are negated
    /// for minimization, all zero in goal mode)
    pub objective: Vec<f64>,
    /// Goals ordered by ascending priority, declaration order within a level
    pub goals: Vec<CanonicalGoal>,
}

impl CanonicalModel {
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn bounds(&self) -> Vec<Bounds> {
        self.variables.iter().map(|v| v.bounds).collect()
    }

    /// The single-objective LP, always posed as a maximization
    pub fn to_lp(&self) -> LpProblem {
        let mut lp = LpProblem::new(self.variables.iter().map(|v| v.name.clone()).collect());
        lp.bounds = self.bounds();
        lp.set_objective(self.objective.clone(), Direction::Maximize);
        for c in &self.constraints {
            lp.add_constraint(c.name.clone(), c.coefficients.clone(), c.sign, c.rhs);
        }
        lp
    }

    /// Sign mapping the internal maximization back onto the caller's direction
    pub fn objective_sign(&self) -> f64 {
        self.direction.map_or(1.0, Direction::sign)
    }

    /// Goal indices grouped by priority level, most important level first
    pub fn priority_levels(&self) -> Vec<(u32, Vec<usize>)> {
        let mut levels: Vec<(u32, Vec<usize>)> = Vec::new();
        for (i, goal) in self.goals.iter().enumerate() {
            match levels.last_mut() {
                Some((priority, members)) if *priority == goal.priority => members.push(i),
                _ => levels.push((goal.priority, vec![i])),
            }
        }
        levels
    }
}

/// Validate `problem` and lower it onto a dense variable index.
pub fn build(problem: &Problem) -> Result<CanonicalModel, ValidationError> {
    if problem.variables.is_empty() {
        return Err(ValidationError::EmptyVariables);
    }

    let n = problem.variables.len();
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
    let mut variables = Vec::with_capacity(n);

    for (j, v) in problem.variables.iter().enumerate() {
        if index.insert(v.id.as_str(), j).is_some() {
            return Err(ValidationError::DuplicateVariable(v.id.clone()));
        }
        if !v.lower_bound.is_finite() || v.upper_bound.is_some_and(f64::is_nan) {
            return Err(ValidationError::NonFinite(format!("bounds of variable '{}'", v.id)));
        }
        if let Some(upper) = v.upper_bound {
            if v.lower_bound > upper {
                return Err(ValidationError::BadBounds {
                    id: v.id.clone(),
                    lower: v.lower_bound,
                    upper,
                });
            }
        }
        // +inf is accepted as an explicit spelling of "no upper bound"
        let upper = v.upper_bound.filter(|u| u.is_finite());
        variables.push(CanonicalVariable {
            id: v.id.clone(),
            name: v.name.clone(),
            bounds: Bounds::new(v.lower_bound, upper),
        });
    }

    match problem.mode {
        Mode::GoalProgramming => {
            if problem.goals.is_empty() {
                return Err(ValidationError::NoGoals);
            }
        }
        Mode::ProfitMax | Mode::CostMin => {
            if !problem.goals.is_empty() {
                return Err(ValidationError::GoalsOutsideGoalMode(problem.goals.len()));
            }
            if problem.constraints.is_empty() {
                return Err(ValidationError::EmptyConstraints);
            }
        }
    }

    let mut constraints = Vec::with_capacity(problem.constraints.len());
    for c in &problem.constraints {
        if !c.rhs.is_finite() {
            return Err(ValidationError::NonFinite(format!("rhs of constraint '{}'", c.name)));
        }
        constraints.push(CanonicalConstraint {
            id: c.id.clone(),
            name: c.name.clone(),
            coefficients: dense_row(&c.name, &c.variables, &index, n)?,
            sign: c.sign,
            rhs: c.rhs,
        });
    }

    let mut goals = Vec::with_capacity(problem.goals.len());
    for g in &problem.goals {
        if g.priority == 0 {
            return Err(ValidationError::InvalidPriority(g.name.clone()));
        }
        if !g.target.is_finite() {
            return Err(ValidationError::NonFinite(format!("target of goal '{}'", g.name)));
        }
        goals.push(CanonicalGoal {
            id: g.id.clone(),
            name: g.name.clone(),
            priority: g.priority,
            direction: g.direction,
            target: g.target,
            coefficients: dense_row(&g.name, &g.variables, &index, n)?,
        });
    }
    // Stable, so goals sharing a priority keep their declaration order
    goals.sort_by_key(|g| g.priority);

    let (direction, objective) = match problem.mode {
        Mode::GoalProgramming => (None, vec![0.0; n]),
        Mode::ProfitMax | Mode::CostMin => {
            let direction = problem.direction.unwrap_or(match problem.mode {
                Mode::CostMin => Direction::Minimize,
                _ => Direction::Maximize,
            });
            let mut objective = Vec::with_capacity(n);
            for v in &problem.variables {
                let per_unit = match problem.mode {
                    Mode::CostMin => v.cost,
                    _ => v.profit,
                }
                .unwrap_or(0.0);
                if !per_unit.is_finite() {
                    return Err(ValidationError::NonFinite(format!("objective coefficient of '{}'", v.id)));
                }
                objective.push(direction.sign() * per_unit);
            }
            (Some(direction), objective)
        }
    };

    tracing::debug!(
        problem = problem.name.as_str(),
        mode = problem.mode.as_str(),
        variables = n,
        constraints = constraints.len(),
        goals = goals.len(),
        "built canonical model"
    );

    Ok(CanonicalModel {
        name: problem.name.clone(),
        mode: problem.mode,
        direction,
        variables,
        constraints,
        objective,
        goals,
    })
}

fn dense_row(row: &str, terms: &[Term], index: &HashMap<&str, usize>, n: usize) -> Result<Vec<f64>, ValidationError> {
    let mut coefficients = vec![0.0; n];
    let mut seen = vec![false; n];

    for term in terms {
        let Some(&j) = index.get(term.variable_id.as_str()) else {
            return Err(ValidationError::DanglingReference {
                row: row.to_string(),
                variable: term.variable_id.clone(),
            });
        };
        if seen[j] {
            return Err(ValidationError::DuplicateTerm {
                row: row.to_string(),
                variable: term.variable_id.clone(),
            });
        }
        if !term.coefficient.is_finite() {
            return Err(ValidationError::NonFinite(format!("coefficient of '{}' in '{}'", term.variable_id, row)));
        }
        seen[j] = true;
        coefficients[j] = term.coefficient;
    }

    if coefficients.iter().all(|&a| a == 0.0) {
        return Err(ValidationError::ZeroRow(row.to_string()));
    }
    Ok(coefficients)
}

fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients.iter().zip(values).map(|(a, x)| a * x).sum()
}
