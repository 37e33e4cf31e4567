use allocopt_solver::Solver;

use crate::assemble::{RawOutcome, Solution, assemble};
use crate::builder::{ValidationError, build};
use crate::goals::{LevelWeighting, solve_goals};
use crate::model::{Mode, Problem};

/// Validates, solves and reports on allocation problems.
///
/// Holds configuration only; every call to [`Engine::solve`] builds its own
/// model and tableau, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct Engine {
    solver: Solver,
    weighting: LevelWeighting,
    /// Relative tolerance below which reported slacks and deviations are zero
    report_tolerance: f64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            solver: Solver::default(),
            weighting: LevelWeighting::default(),
            report_tolerance: 1e-7,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_weighting(mut self, weighting: LevelWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_report_tolerance(mut self, tol: f64) -> Self {
        self.report_tolerance = tol;
        self
    }

    pub fn report_tolerance(&self) -> f64 {
        self.report_tolerance
    }

    /// Validate and solve `problem`.
    ///
    /// Infeasible, unbounded, unresolved and cancelled solves are not errors:
    /// they come back as a [`Solution`] with `feasible == false`.
    pub fn solve(&self, problem: &Problem) -> Result<Solution, ValidationError> {
        let model = build(problem)?;

        let raw = match model.mode {
            Mode::ProfitMax | Mode::CostMin => RawOutcome::Single(self.solver.solve(&model.to_lp())?),
            Mode::GoalProgramming => RawOutcome::Goals(solve_goals(&model, &self.solver, self.weighting)?),
        };

        let solution = assemble(&model, raw, self.report_tolerance);
        tracing::debug!(
            problem = solution.name.as_str(),
            status = solution.status.as_str(),
            feasible = solution.feasible,
            iterations = solution.iterations,
            "solved problem"
        );
        Ok(solution)
    }
}

/// Solve `problem` with the default engine configuration.
pub fn solve(problem: &Problem) -> Result<Solution, ValidationError> {
    Engine::default().solve(problem)
}
