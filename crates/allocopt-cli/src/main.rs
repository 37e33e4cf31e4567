use allocopt_engine::{Engine, LevelWeighting, Problem, Solver};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "allocopt")]
#[command(about = "Profit, cost and goal-programming optimization for resource allocation", long_about = None)]
struct Cli {
    /// Log solver progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print the result
    Solve {
        /// JSON file describing the problem
        file: PathBuf,
        /// Print the full solution as JSON instead of the summary
        #[arg(long)]
        json: bool,
        /// Weigh deviations within a priority level relative to their targets
        #[arg(long)]
        relative_weights: bool,
        /// Override the pivot limit
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Validate a problem without solving it
    Check {
        /// JSON file describing the problem
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            json,
            relative_weights,
            max_iterations,
        } => {
            let problem = read_problem(&file).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            });

            let mut solver = Solver::new();
            if let Some(max) = max_iterations {
                solver = solver.with_max_iterations(max);
            }
            let weighting = if relative_weights {
                LevelWeighting::RelativeToTarget
            } else {
                LevelWeighting::Equal
            };
            let engine = Engine::new().with_solver(solver).with_weighting(weighting);

            let solution = match engine.solve(&problem) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Invalid problem: {}", e);
                    std::process::exit(1);
                }
            };

            if json {
                match serde_json::to_string_pretty(&solution) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Error writing JSON: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", solution.summary);
            }

            if !solution.feasible {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let problem = read_problem(&file).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            });

            match allocopt_engine::build(&problem) {
                Ok(model) => {
                    println!("✓ {} is valid", file.display());
                    println!("  mode: {}", model.mode.as_str());
                    println!("  {} variables", model.variables.len());
                    println!("  {} constraints", model.constraints.len());
                    println!("  {} goals", model.goals.len());
                    println!("  {} priority levels", model.priority_levels().len());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` enables debug and `-vv` trace for this binary and the engine crates
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "allocopt=debug,allocopt_solver=debug,allocopt_engine=debug",
        _ => "allocopt=trace,allocopt_solver=trace,allocopt_engine=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn read_problem(path: &Path) -> Result<Problem, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    let problem = parse_problem(&source)?;
    tracing::debug!(
        file = %path.display(),
        problem = problem.name.as_str(),
        mode = problem.mode.as_str(),
        variables = problem.variables.len(),
        constraints = problem.constraints.len(),
        goals = problem.goals.len(),
        "loaded problem"
    );
    Ok(problem)
}

fn parse_problem(source: &str) -> Result<Problem, String> {
    serde_json::from_str(source).map_err(|e| format!("Parse error: {}", e))
}
