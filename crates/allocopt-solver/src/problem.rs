use thiserror::Error;

/// Represents a linear programming problem over bounded variables
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Bounds for each variable
    pub bounds: Vec<Bounds>,
    /// Objective function
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Sign that maps an objective in this direction onto the solver's
    /// internal maximization.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    pub direction: Direction,
}

/// Closed interval a variable may take. `upper == None` is +infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub lower: f64,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn new(lower: f64, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    /// `[0, +inf)`
    pub fn non_negative() -> Self {
        Self::new(0.0, None)
    }

    /// `[value, value]`
    pub fn fixed(value: f64) -> Self {
        Self::new(value, Some(value))
    }

    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        value >= self.lower - tolerance && self.upper.is_none_or(|u| value <= u + tolerance)
    }

    /// Width of the interval, `None` when unbounded above.
    pub fn width(&self) -> Option<f64> {
        self.upper.map(|u| u - self.lower)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::non_negative()
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

impl Constraint {
    /// Left-hand side evaluated at `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients.iter().zip(values).map(|(a, x)| a * x).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

/// Structural defects that make an [`LpProblem`] impossible to load into a tableau.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Expected {expected} bounds, got {actual}")]
    BoundsLength { expected: usize, actual: usize },
    #[error("Objective has {actual} coefficients for {expected} variables")]
    ObjectiveLength { expected: usize, actual: usize },
    #[error("Constraint '{name}' has {actual} coefficients for {expected} variables")]
    ConstraintLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Variable '{0}' has an empty or non-finite bound interval")]
    InvalidBounds(String),
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            bounds: vec![Bounds::non_negative(); n],
            objective: Objective {
                coefficients: vec![0.0; n],
                direction: Direction::Maximize,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, direction: Direction) {
        self.objective = Objective { coefficients, direction };
    }

    pub fn set_bounds(&mut self, variable: usize, bounds: Bounds) {
        if let Some(slot) = self.bounds.get_mut(variable) {
            *slot = bounds;
        }
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check dimensions and numeric sanity before building a tableau.
    pub fn check(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();
        if self.bounds.len() != n {
            return Err(ProblemError::BoundsLength {
                expected: n,
                actual: self.bounds.len(),
            });
        }
        if self.objective.coefficients.len() != n {
            return Err(ProblemError::ObjectiveLength {
                expected: n,
                actual: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }
        for (name, b) in self.variables.iter().zip(&self.bounds) {
            let upper_ok = b.upper.is_none_or(|u| !u.is_nan() && u >= b.lower);
            if !b.lower.is_finite() || !upper_ok {
                return Err(ProblemError::InvalidBounds(name.clone()));
            }
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintLength {
                    name: c.name.clone(),
                    expected: n,
                    actual: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(ProblemError::NonFinite(format!("constraint '{}'", c.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rejects_short_rows() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 4.0);

        assert_eq!(
            problem.check(),
            Err(ProblemError::ConstraintLength {
                name: "short".to_string(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_check_rejects_inverted_bounds() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_bounds(0, Bounds::new(5.0, Some(1.0)));

        assert_eq!(problem.check(), Err(ProblemError::InvalidBounds("x".to_string())));
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(-2.0, None);
        assert!(b.contains(1e12, 1e-9));
        assert!(b.contains(-2.0 - 1e-10, 1e-9));
        assert!(!b.contains(-2.1, 1e-9));
        assert_eq!(Bounds::fixed(3.0).width(), Some(0.0));
    }
}
