/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value, in the problem's own direction
    pub objective_value: Option<f64>,
    /// Pivots and bound flips performed across both phases
    pub iterations: usize,
    /// Sensitivity of the optimum (empty unless optimal)
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot cap was reached before the method terminated
    Unresolved,
    /// The caller raised the cancellation flag
    Cancelled,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::Unresolved => "unresolved",
            SolutionStatus::Cancelled => "cancelled",
        }
    }
}

/// Dual information at the optimum
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    /// Shadow price per constraint: change of the objective per unit
    /// increase of the constraint's right-hand side
    pub shadow_prices: Vec<f64>,
    /// Reduced cost per variable: change of the objective per unit
    /// increase of the variable away from its current bound
    pub reduced_costs: Vec<f64>,
    /// Whether each variable is basic at the optimum
    pub basic: Vec<bool>,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, iterations: usize, analysis: Analysis) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value: Some(objective_value),
            iterations,
            analysis,
        }
    }

    /// A non-optimal outcome. Never carries numeric values.
    pub fn without_values(status: SolutionStatus, iterations: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            iterations,
            analysis: Analysis::default(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
