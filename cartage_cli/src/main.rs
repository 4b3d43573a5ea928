use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::debug;

use cartage_solver::json::{self, output::ErrorDocument};
use cartage_solver::solver::{solver::Solver, solver_params::SolverParams};
use cartage_solver::SolverError;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const EXIT_INTERNAL: u8 = 1;
const EXIT_INPUT: u8 = 2;
const EXIT_ROUTING: u8 = 3;
const EXIT_NO_SOLUTION: u8 = 4;

#[derive(Parser)]
#[clap(author, version, about = "Vehicle routing problem solver", long_about = None)]
struct Cli {
    /// Problem file, or `-` for stdin.
    input: PathBuf,

    /// Output file; defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of search worker threads.
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Exploration level in [0, 5]; higher runs more heuristic seeds.
    #[arg(short = 'x', long)]
    exploration_level: Option<u32>,

    /// Soft run-time limit in milliseconds.
    #[arg(short = 'l', long)]
    limit: Option<u64>,

    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            let (exit, code) = match &error {
                SolverError::Internal(_) => (EXIT_INTERNAL, 1),
                SolverError::Input(_) => (EXIT_INPUT, 2),
                SolverError::Routing(_) => (EXIT_ROUTING, 3),
            };
            eprintln!("{}", ErrorDocument::new(code, error.to_string()).to_json());
            ExitCode::from(exit)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, SolverError> {
    let loading_started = Instant::now();

    let raw = read_input(&cli.input).map_err(|e| SolverError::Input(format!("{e:#}")))?;
    let problem = json::parse_problem(&raw)?;
    let requested = problem.jobs().len();
    let loading_ms = loading_started.elapsed().as_millis() as u64;
    debug!(
        jobs = requested,
        vehicles = problem.vehicles().len(),
        loading_ms,
        "problem loaded"
    );

    let mut params = SolverParams::default();
    if let Some(threads) = cli.threads {
        params.threads = threads;
    }
    if let Some(level) = cli.exploration_level {
        params.exploration_level = level;
    }
    if let Some(limit) = cli.limit {
        params.timeout = Some(Duration::from_millis(limit));
    }

    let solver = Solver::new(problem, params);
    let outcome = solver.solve();

    let no_solution = requested > 0 && outcome.solution.assigned_count() == 0;

    let document = json::solution_document(&outcome, loading_ms);
    let rendered = json::output::to_json(&document);
    match &cli.output {
        Some(path) => write_output(path, &rendered)
            .map_err(|e| SolverError::Internal(format!("{e:#}")))?,
        None => println!("{rendered}"),
    }

    if no_solution {
        return Ok(ExitCode::from(EXIT_NO_SOLUTION));
    }
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading problem from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading problem from {}", path.display()))
    }
}

fn write_output(path: &Path, rendered: &str) -> anyhow::Result<()> {
    std::fs::write(path, rendered)
        .with_context(|| format!("writing solution to {}", path.display()))
}
