//! Problem description as handed over by the caller.
//!
//! These types are deliberately loose (string ids, optional fields); the
//! [`builder`](crate::builder) turns them into a validated canonical model.

pub use allocopt_solver::{ConstraintOp, Direction};

/// A resource allocation problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Problem {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(alias = "type"))]
    pub mode: Mode,
    /// Explicit objective direction for profit/cost modes. Defaults to
    /// maximize for `ProfitMax` and minimize for `CostMin`.
    #[cfg_attr(feature = "serde", serde(default, alias = "objective"))]
    pub direction: Option<Direction>,
    pub variables: Vec<Variable>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<Constraint>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub goals: Vec<Goal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Maximize total profit
    ProfitMax,
    /// Minimize total cost
    CostMin,
    /// Satisfy prioritized goals lexicographically
    GoalProgramming,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ProfitMax => "profit_max",
            Mode::CostMin => "cost_min",
            Mode::GoalProgramming => "goal_programming",
        }
    }
}

/// A decision variable
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lower_bound: f64,
    /// `None` is +infinity
    #[cfg_attr(feature = "serde", serde(default))]
    pub upper_bound: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub profit: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<f64>,
}

impl Variable {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lower_bound: f64, upper_bound: Option<f64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lower_bound,
            upper_bound,
            profit: None,
            cost: None,
        }
    }

    pub fn with_profit(mut self, profit: f64) -> Self {
        self.profit = Some(profit);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

/// One `coefficient * variable` term of a row
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Term {
    pub variable_id: String,
    pub coefficient: f64,
}

impl Term {
    pub fn new(variable_id: impl Into<String>, coefficient: f64) -> Self {
        Self {
            variable_id: variable_id.into(),
            coefficient,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    pub id: String,
    pub name: String,
    pub variables: Vec<Term>,
    pub rhs: f64,
    pub sign: ConstraintOp,
}

impl Constraint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, variables: Vec<Term>, sign: ConstraintOp, rhs: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variables,
            rhs,
            sign,
        }
    }
}

/// Which way a goal wants its expression to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GoalDirection {
    /// Reach at least the target; falling short is penalized
    Max,
    /// Stay at or below the target; overshooting is penalized
    Min,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Goal {
    pub id: String,
    pub name: String,
    /// 1 is the most important level
    pub priority: u32,
    pub direction: GoalDirection,
    pub target: f64,
    pub variables: Vec<Term>,
}

impl Goal {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: u32,
        direction: GoalDirection,
        target: f64,
        variables: Vec<Term>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            direction,
            target,
            variables,
        }
    }
}
