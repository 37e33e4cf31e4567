pub mod assemble;
pub mod builder;
pub mod engine;
pub mod goals;
pub mod model;

pub use allocopt_solver::{SolutionStatus, Solver};
pub use assemble::{ConstraintReport, GoalReport, GoalState, LastSolved, Solution, VariableValue};
pub use builder::{CanonicalModel, ValidationError, build};
pub use engine::{Engine, solve};
pub use goals::{LevelOutcome, LevelWeighting};
pub use model::{Constraint, ConstraintOp, Direction, Goal, GoalDirection, Mode, Problem, Term, Variable};
