use allocopt_engine::{ConstraintOp, Direction, GoalDirection, GoalState, Mode, Problem, solve};

const FARM: &str = r#"{
    "name": "Farm Optimization",
    "type": "profit_max",
    "objective": "maximize",
    "variables": [
        { "id": "a", "name": "Product A", "lowerBound": 0, "upperBound": 100, "profit": 10 },
        { "id": "b", "name": "Product B", "lowerBound": 0, "upperBound": 100, "profit": 15 }
    ],
    "constraints": [
        {
            "id": "land",
            "name": "Land Constraint",
            "variables": [
                { "variableId": "a", "coefficient": 2 },
                { "variableId": "b", "coefficient": 3 }
            ],
            "rhs": 100,
            "sign": "<="
        }
    ]
}"#;

#[test]
fn problem_parses_from_client_json() {
    let problem: Problem = serde_json::from_str(FARM).unwrap();

    assert_eq!(problem.mode, Mode::ProfitMax);
    assert_eq!(problem.direction, Some(Direction::Maximize));
    assert_eq!(problem.variables[1].upper_bound, Some(100.0));
    assert_eq!(problem.variables[0].cost, None);
    assert_eq!(problem.constraints[0].sign, ConstraintOp::Le);
    assert_eq!(problem.constraints[0].variables[1].variable_id, "b");
    assert!(problem.goals.is_empty());
}

#[test]
fn goals_and_missing_upper_bounds_parse() {
    let json = r#"{
        "name": "Plan",
        "mode": "goal_programming",
        "variables": [{ "id": "x", "name": "X" }],
        "constraints": [
            { "id": "c", "name": "Cap", "variables": [{ "variableId": "x", "coefficient": 1 }], "rhs": 5, "sign": ">=" }
        ],
        "goals": [
            { "id": "g", "name": "Reach", "priority": 1, "direction": "max", "target": 8,
              "variables": [{ "variableId": "x", "coefficient": 1 }] }
        ]
    }"#;

    let problem: Problem = serde_json::from_str(json).unwrap();

    assert_eq!(problem.mode, Mode::GoalProgramming);
    assert_eq!(problem.direction, None);
    assert_eq!(problem.variables[0].lower_bound, 0.0);
    assert_eq!(problem.variables[0].upper_bound, None);
    assert_eq!(problem.goals[0].direction, GoalDirection::Max);

    let solution = solve(&problem).unwrap();
    assert!(solution.feasible);
    assert!(solution.goals[0].achievement.unwrap() >= 8.0);
    assert_eq!(solution.goals[0].state, GoalState::Met);
}

#[test]
fn solution_serializes_with_camel_case_fields() {
    let problem: Problem = serde_json::from_str(FARM).unwrap();
    let solution = solve(&problem).unwrap();

    let value = serde_json::to_value(&solution).unwrap();

    assert_eq!(value["status"], "optimal");
    assert_eq!(value["feasible"], true);
    assert!((value["objectiveValue"].as_f64().unwrap() - 500.0).abs() < 1e-6);
    assert_eq!(value["constraints"][0]["sign"], "<=");
    assert_eq!(value["constraints"][0]["binding"], true);
    assert!(value["constraints"][0]["shadowPrice"].is_number());
}
