mod problem;
mod simplex;
mod solution;

pub use problem::{Bounds, Constraint, ConstraintOp, Direction, LpProblem, Objective, ProblemError};
pub use simplex::Solver;
pub use solution::{Analysis, Solution, SolutionStatus};
