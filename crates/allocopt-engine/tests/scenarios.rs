use allocopt_engine::{
    Constraint, ConstraintOp, Engine, Goal, GoalDirection, GoalState, Mode, Problem, Solution, SolutionStatus, Solver,
    Term, ValidationError, Variable, solve,
};

const TOL: f64 = 1e-6;

fn farm() -> Problem {
    Problem {
        name: "Farm Optimization".to_string(),
        mode: Mode::ProfitMax,
        direction: None,
        variables: vec![
            Variable::new("a", "Product A", 0.0, Some(100.0)).with_profit(10.0),
            Variable::new("b", "Product B", 0.0, Some(100.0)).with_profit(15.0),
        ],
        constraints: vec![Constraint::new(
            "land",
            "Land Constraint",
            vec![Term::new("a", 2.0), Term::new("b", 3.0)],
            ConstraintOp::Le,
            100.0,
        )],
        goals: Vec::new(),
    }
}

/// Priority 1 wants profit of at least 480, priority 2 wants labour of at most 10.
/// Reaching the profit needs 2A + 3B >= 96, which costs at least 48 labour.
fn farm_goals() -> Problem {
    let mut problem = farm();
    problem.mode = Mode::GoalProgramming;
    problem.goals = vec![
        Goal::new(
            "profit",
            "Profit target",
            1,
            GoalDirection::Max,
            480.0,
            vec![Term::new("a", 10.0), Term::new("b", 15.0)],
        ),
        Goal::new(
            "labour",
            "Labour cap",
            2,
            GoalDirection::Min,
            10.0,
            vec![Term::new("a", 1.0), Term::new("b", 2.0)],
        ),
    ];
    problem
}

fn assert_within_bounds_and_satisfied(problem: &Problem, solution: &Solution) {
    assert!(solution.feasible);
    for (v, value) in problem.variables.iter().zip(&solution.variables) {
        assert!(value.value >= v.lower_bound - TOL, "{} below bound: {}", v.name, value.value);
        if let Some(upper) = v.upper_bound {
            assert!(value.value <= upper + TOL, "{} above bound: {}", v.name, value.value);
        }
    }
    for c in &solution.constraints {
        assert!(c.slack >= -TOL, "{} has slack {}", c.name, c.slack);
        assert_eq!(c.satisfied, c.slack >= -TOL, "{}", c.name);
    }
}

#[test]
fn profit_maximization_reaches_the_land_limit() {
    let problem = farm();
    let solution = solve(&problem).unwrap();

    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!(solution.feasible);
    let objective = solution.objective_value.unwrap();
    assert!((objective - 500.0).abs() < TOL, "objective = {objective}");

    // Any point on 2A + 3B = 100 earns 500; the land row must be binding
    let land = &solution.constraints[0];
    assert!(land.binding);
    assert_eq!(land.slack, 0.0);
    assert!((land.shadow_price.unwrap() - 5.0).abs() < TOL);

    assert_within_bounds_and_satisfied(&problem, &solution);
    assert!(solution.summary.contains("Total profit (maximize): 500.0000"));
    assert!(solution.summary.contains("Binding constraints: Land Constraint"));
}

#[test]
fn contradictory_constraints_are_infeasible() {
    let mut problem = farm();
    problem.constraints.push(Constraint::new(
        "a_min",
        "A at least 60",
        vec![Term::new("a", 1.0)],
        ConstraintOp::Ge,
        60.0,
    ));
    problem.constraints.push(Constraint::new(
        "a_max",
        "A at most 10",
        vec![Term::new("a", 1.0)],
        ConstraintOp::Le,
        10.0,
    ));

    let solution = solve(&problem).unwrap();

    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert!(!solution.feasible);
    assert!(solution.objective_value.is_none());
    assert!(solution.variables.is_empty());
    assert!(solution.constraints.is_empty());
    assert!(solution.summary.contains("not feasible"));
}

#[test]
fn unbounded_profit_is_reported() {
    let problem = Problem {
        name: "Open ended".to_string(),
        mode: Mode::ProfitMax,
        direction: None,
        variables: vec![Variable::new("x", "X", 0.0, None).with_profit(3.0)],
        constraints: vec![Constraint::new(
            "floor",
            "Minimum run",
            vec![Term::new("x", 1.0)],
            ConstraintOp::Ge,
            1.0,
        )],
        goals: Vec::new(),
    };

    let solution = solve(&problem).unwrap();

    assert_eq!(solution.status, SolutionStatus::Unbounded);
    assert!(!solution.feasible);
    assert!(solution.variables.is_empty());
}

#[test]
fn higher_priority_goal_forces_a_lower_priority_shortfall() {
    let problem = farm_goals();
    let solution = solve(&problem).unwrap();

    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!(solution.feasible);
    assert!(solution.objective_value.is_none());
    assert_eq!(solution.levels.len(), 2);
    assert!(solution.last_solved.is_none());

    let profit = &solution.goals[0];
    assert_eq!(profit.state, GoalState::Met);
    assert_eq!(profit.achievement, Some(480.0));
    assert_eq!(profit.deviation, Some(0.0));

    let labour = &solution.goals[1];
    assert_eq!(labour.state, GoalState::Missed);
    assert!((labour.achievement.unwrap() - 48.0).abs() < TOL);
    assert!((labour.deviation.unwrap() - 38.0).abs() < TOL);

    assert!((solution.variables[0].value - 48.0).abs() < TOL);
    assert!(solution.variables[1].value.abs() < TOL);
    assert_within_bounds_and_satisfied(&problem, &solution);
}

#[test]
fn tightening_a_lower_priority_goal_keeps_higher_achievements() {
    let baseline = solve(&farm_goals()).unwrap();

    let mut tightened = farm_goals();
    tightened.constraints.push(Constraint::new(
        "b_min",
        "Some B",
        vec![Term::new("b", 1.0)],
        ConstraintOp::Ge,
        5.0,
    ));
    let solution = solve(&tightened).unwrap();

    assert!(solution.feasible);
    assert_eq!(solution.goals[0].achievement, baseline.goals[0].achievement);
    assert_eq!(solution.goals[0].state, GoalState::Met);
    // 2A + 3B >= 96 with B >= 5 now needs A = 40.5, labour 50.5
    assert!((solution.goals[1].deviation.unwrap() - 40.5).abs() < TOL);
}

#[test]
fn lower_level_failure_keeps_the_last_solved_assignment_apart() {
    // One pivot is enough for priority 1 but not for priority 2
    let engine = Engine::new().with_solver(Solver::new().with_max_iterations(1));

    let solution = engine.solve(&farm_goals()).unwrap();

    assert!(!solution.feasible);
    assert_eq!(solution.status, SolutionStatus::Unresolved);
    assert_eq!(solution.levels.len(), 2);
    assert_eq!(solution.levels[0].status, SolutionStatus::Optimal);
    assert_eq!(solution.levels[1].status, SolutionStatus::Unresolved);
    assert_eq!(solution.levels[1].achieved, None);

    // A non-optimal status never carries values in the main fields
    assert!(solution.variables.is_empty());
    assert!(solution.constraints.is_empty());
    assert!(solution.objective_value.is_none());

    let last = solution.last_solved.as_ref().unwrap();
    assert_eq!(last.priority, 1);
    assert_eq!(last.variables.len(), 2);
    let profit: f64 = 10.0 * last.variables[0].value + 15.0 * last.variables[1].value;
    assert!(profit >= 480.0 - TOL, "profit = {profit}");

    assert_eq!(solution.goals[0].state, GoalState::Met);
    assert_eq!(solution.goals[0].achievement, Some(480.0));
    assert_eq!(solution.goals[1].state, GoalState::Unattained);
    assert!(solution.goals[1].achievement.is_none());
    assert!(solution.goals[1].deviation.is_none());

    assert!(solution.summary.contains("Status: unresolved (not feasible)"));
    assert!(solution.summary.contains("Priority 2 could not be solved (unresolved)"));
    assert!(solution.summary.contains("Last solved assignment (priority 1):"));
    assert!(!solution.summary.contains("Variables:"));
}

#[test]
fn single_goal_reports_its_achievement_as_objective() {
    let mut problem = farm_goals();
    problem.goals.truncate(1);

    let solution = solve(&problem).unwrap();

    assert_eq!(solution.objective_value, solution.goals[0].achievement);
    assert!(solution.objective_value.unwrap() >= 480.0);
    assert_eq!(solution.goals[0].state, GoalState::Met);
}

#[test]
fn infeasible_goal_base_marks_every_goal_unattained() {
    let mut problem = farm_goals();
    problem.constraints.push(Constraint::new(
        "a_min",
        "A at least 60",
        vec![Term::new("a", 1.0)],
        ConstraintOp::Ge,
        60.0,
    ));

    let solution = solve(&problem).unwrap();

    assert!(!solution.feasible);
    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert!(solution.variables.is_empty());
    assert!(solution.goals.iter().all(|g| g.state == GoalState::Unattained));
    assert!(solution.goals.iter().all(|g| g.achievement.is_none()));
    assert!(solution.last_solved.is_none());
    assert!(solution.summary.contains("Priority 1 could not be solved (infeasible)"));
}

#[test]
fn cost_minimization_with_explicit_direction() {
    let problem = Problem {
        name: "Feed".to_string(),
        mode: Mode::CostMin,
        direction: None,
        variables: vec![
            Variable::new("x", "Corn", 0.0, Some(3.0)).with_cost(2.0),
            Variable::new("y", "Soy", 0.0, Some(3.0)).with_cost(3.0),
        ],
        constraints: vec![Constraint::new(
            "need",
            "Demand",
            vec![Term::new("x", 1.0), Term::new("y", 1.0)],
            ConstraintOp::Ge,
            4.0,
        )],
        goals: Vec::new(),
    };

    let solution = solve(&problem).unwrap();

    assert!((solution.objective_value.unwrap() - 9.0).abs() < TOL);
    assert!((solution.variables[0].value - 3.0).abs() < TOL);
    assert!((solution.variables[1].value - 1.0).abs() < TOL);
    // One more unit of demand is met with soy at 3
    assert!((solution.constraints[0].shadow_price.unwrap() - 3.0).abs() < TOL);
    assert!(solution.summary.contains("Total cost (minimize): 9.0000"));
    assert_within_bounds_and_satisfied(&problem, &solution);
}

#[test]
fn identical_inputs_give_identical_solutions() {
    for problem in [farm(), farm_goals()] {
        let first = solve(&problem).unwrap();
        let second = solve(&problem).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn pivot_cap_is_reported_as_unresolved() {
    let engine = Engine::new().with_solver(Solver::new().with_max_iterations(0));

    let solution = engine.solve(&farm()).unwrap();

    assert_eq!(solution.status, SolutionStatus::Unresolved);
    assert!(!solution.feasible);
    assert!(solution.variables.is_empty());
}

#[test]
fn validation_happens_before_solving() {
    let mut problem = farm();
    problem.constraints.clear();
    assert_eq!(solve(&problem), Err(ValidationError::EmptyConstraints));

    let mut problem = farm();
    problem.variables[1].upper_bound = Some(-1.0);
    assert!(matches!(solve(&problem), Err(ValidationError::BadBounds { .. })));
}
