//! flight: command-line front end for the rust_drone lock-step simulator.
//!
//! Loads a swarm (CSV flight plans, a seeded random swarm, or the bundled
//! demo swarm), runs it with one thread per drone, prints the grid after
//! every step and writes the run report.  The process exit code is 0 when
//! every drone completed its plan below the collision threshold, 1 otherwise.
//! A run that cannot start (bad config, bad plans) still leaves a closed
//! report with the error and a failed status.

mod config;

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use ds_core::RunStatus;
use ds_output::{
    ConsoleObserver, CsvReportWriter, EventReporter, ReportWriter, RunSummary, TextReportWriter,
};
use ds_plan::{FlightPlan, RandomPlanSpec, generate_plans, load_plans_csv, load_plans_reader};
use ds_sim::{NoopObserver, RunOutcome, Sim, SimBuilder, SimResult};

use config::FlightConfig;

/// Swarm used when neither `--plans` nor `--random` is given.
const DEMO_PLANS_CSV: &str = include_str!("../plans.csv");

#[derive(Parser, Debug)]
#[command(name = "flight", version, about = "Lock-step drone swarm simulator")]
struct Cli {
    /// Flight plan CSV (`id,x,y,z,INSTR;INSTR;...` with a header row)
    #[arg(short, long, conflicts_with = "random")]
    plans: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text report path (overrides the config file)
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Also write drone_steps.csv, collisions.csv and run_summary.csv into this directory
    #[arg(long, value_name = "DIR")]
    csv: Option<PathBuf>,

    /// Also write report.db into this directory
    #[cfg(feature = "sqlite")]
    #[arg(long, value_name = "DIR")]
    sqlite: Option<PathBuf>,

    /// Generate a random swarm of N drones instead of loading plans
    #[arg(long, value_name = "N")]
    random: Option<usize>,

    /// Instructions per drone for --random
    #[arg(long, default_value_t = 20)]
    instructions: usize,

    /// Seed for --random
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Collision threshold (overrides the config file)
    #[arg(long)]
    threshold: Option<u64>,

    /// Last step the run may execute (overrides the config file)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Pause after each step, in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Do not print the per-step display
    #[arg(short, long)]
    quiet: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // The file's own report path is unknown here.
            let mut fallback = FlightConfig::default();
            if let Some(path) = &cli.report {
                fallback.output.report = path.clone();
            }
            return Err(abort_report(&fallback, &[], e));
        }
    };
    let plans = match load_swarm(&cli, &config) {
        Ok(plans) => plans,
        Err(e) => return Err(abort_report(&config, &[], e)),
    };
    let drones = plans.len();
    println!("=== flight: rust_drone lock-step simulator ===");
    println!(
        "Drones: {drones}  |  Max steps: {}  |  Collision threshold: {}",
        config.sim.max_steps, config.sim.collision_threshold,
    );
    println!();

    // 1. Build the sim; plan and config errors stop here.
    let (tx, rx) = crossbeam_channel::unbounded();
    let built = SimBuilder::new(config.sim.clone(), plans.clone())
        .event_channel(tx)
        .build();
    let mut sim = match built {
        Ok(sim) => sim,
        Err(e) => return Err(abort_report(&config, &plans, e.into())),
    };

    // 2. Start the reporter.
    let writers = open_writers(&config)?;
    let reporter = EventReporter::spawn(writers, &plans, rx)?;

    // 3. Run.
    let t0 = Instant::now();
    let result = if cli.quiet {
        sim.run(&mut NoopObserver)
    } else {
        let mut obs = ConsoleObserver::new(io::stdout());
        if !config.output.grid {
            obs = obs.without_grid();
        }
        run_observed(&mut sim, &mut obs)
    };
    let elapsed = t0.elapsed();
    // Releases the event sender even if the run never started.
    drop(sim);
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            let e = anyhow::Error::from(e);
            if let Err(w) = reporter.finish(&RunSummary::not_started(drones, format!("{e:#}"))) {
                tracing::warn!(error = %w, "failed to close report");
            }
            return Err(e);
        }
    };

    // 4. Close the report.
    let summary = RunSummary::from_outcome(&outcome, drones);
    reporter
        .finish(&summary)
        .with_context(|| format!("Failed to write report: {}", config.output.report.display()))?;

    print_outcome(&outcome, elapsed.as_secs_f64(), &config.output.report);
    Ok(ExitCode::from(outcome.status.exit_code() as u8))
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<FlightConfig> {
    let mut config = FlightConfig::load(cli.config.as_deref())?;
    if let Some(t) = cli.threshold {
        config.sim.collision_threshold = t;
    }
    if let Some(n) = cli.max_steps {
        config.sim.max_steps = n;
    }
    if let Some(ms) = cli.pause_ms {
        config.sim.step_pause_ms = ms;
    }
    if let Some(path) = &cli.report {
        config.output.report = path.clone();
    }
    if let Some(dir) = &cli.csv {
        config.output.csv_dir = Some(dir.clone());
    }
    #[cfg(feature = "sqlite")]
    if let Some(dir) = &cli.sqlite {
        config.output.sqlite_dir = Some(dir.clone());
    }
    config.sim.validate()?;
    Ok(config)
}

fn load_swarm(cli: &Cli, config: &FlightConfig) -> Result<Vec<FlightPlan>> {
    if let Some(n) = cli.random {
        let spec = RandomPlanSpec {
            drones:       n,
            instructions: cli.instructions,
            seed:         cli.seed,
            ..RandomPlanSpec::default()
        };
        tracing::info!(drones = n, seed = cli.seed, "generating random swarm");
        return Ok(generate_plans(&spec));
    }
    match &cli.plans {
        Some(path) => load_plans_csv(path, &config.sim)
            .with_context(|| format!("Failed to load flight plans: {}", path.display())),
        None => {
            tracing::info!("no plan file given, using the bundled demo swarm");
            Ok(load_plans_reader(Cursor::new(DEMO_PLANS_CSV), &config.sim)?)
        }
    }
}

fn open_writers(config: &FlightConfig) -> Result<Vec<Box<dyn ReportWriter + Send>>> {
    let path = config.output.report.as_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = TextReportWriter::create(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    let mut writers: Vec<Box<dyn ReportWriter + Send>> = vec![Box::new(text)];

    if let Some(dir) = &config.output.csv_dir {
        std::fs::create_dir_all(dir)?;
        writers.push(Box::new(CsvReportWriter::new(dir)?));
    }

    #[cfg(feature = "sqlite")]
    if let Some(dir) = &config.output.sqlite_dir {
        std::fs::create_dir_all(dir)?;
        writers.push(Box::new(ds_output::SqliteReportWriter::new(dir)?));
    }
    #[cfg(not(feature = "sqlite"))]
    if config.output.sqlite_dir.is_some() {
        tracing::warn!("sqlite_dir set but flight was built without the `sqlite` feature");
    }

    Ok(writers)
}

/// Leave a closed report for a run that never started, then hand `error`
/// back to the caller.
fn abort_report(config: &FlightConfig, plans: &[FlightPlan], error: anyhow::Error) -> anyhow::Error {
    let summary = RunSummary::not_started(plans.len(), format!("{error:#}"));
    let written = open_writers(config).and_then(|mut writers| {
        let header = writers.write_header(plans);
        let summary = writers.write_summary(&summary);
        let closed = writers.finish();
        header.and(summary).and(closed)?;
        Ok(())
    });
    if let Err(e) = written {
        tracing::warn!(error = %e, "failed to write report");
    }
    error
}

fn run_observed(sim: &mut Sim, obs: &mut ConsoleObserver<io::Stdout>) -> SimResult<RunOutcome> {
    let result = sim.run(obs);
    if let Some(e) = obs.take_error() {
        tracing::warn!(error = %e, "console output failed");
    }
    result
}

fn print_outcome(outcome: &RunOutcome, secs: f64, report: &Path) {
    println!();
    println!("Simulation complete in {secs:.3} s");
    println!("  steps executed : {}", outcome.steps_executed);
    println!("  collisions     : {}", outcome.collisions);
    if !outcome.lost_drones.is_empty() {
        let lost: Vec<String> = outcome.lost_drones.iter().map(|d| d.get().to_string()).collect();
        println!("  lost drones    : {}", lost.join(", "));
    }
    println!("  status         : {}", outcome.status.describe());
    println!("  report         : {}", report.display());
    if outcome.status == RunStatus::FailureThreshold {
        println!("  (collision threshold reached; remaining steps were not executed)");
    }
}
