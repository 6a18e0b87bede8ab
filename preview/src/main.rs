//! Dry-run front end for arena-handler
//!
//! Reads a state or experiment payload from a file, prints the receipt the
//! command front end would answer with, then plays the command through the
//! scheduler against a session that only logs instructions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread::sleep;
use std::time::Duration as StdDuration;

use arena_handler::{
    DryRunSession, HandlerConfig, LinkConfig, Receipt, Scheduler, SchedulerStatus, parse_experiment,
    parse_state,
};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{Directive, EnvFilter};

/// Baud rate of the stock controller firmware
const DEFAULT_BAUD_RATE: u32 = 57_600;

/// How often to check whether the scheduler has drained
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

#[derive(Parser)]
#[command(name = "arena-preview", about = "Play arena commands against a dry-run session")]
struct Cli {
    /// Handler config (serial port, baud rate, log level, timings)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the link settle and per-instruction delays
    #[arg(long)]
    instant: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a single state: `{"arena": {...}}`
    State { file: PathBuf },
    /// Run a timed experiment: `{"experiment": {...}}`
    Experiment { file: PathBuf },
}

fn init_logging(level: &str) {
    let default: Directive = level.parse().unwrap_or_else(|_| LevelFilter::INFO.into());
    let filter = EnvFilter::builder()
        .with_default_directive(default)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn read_payload(path: &Path) -> Result<String, arena_handler::Error> {
    std::fs::read_to_string(path)
        .map_err(|e| arena_handler::Error::MalformedCommand(format!("{}: {e}", path.display())))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(HandlerConfig::load).transpose() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.as_ref().map_or_else(|| "info".to_owned(), HandlerConfig::log_filter));

    let link = config
        .as_ref()
        .map_or_else(|| LinkConfig::new("dry-run", DEFAULT_BAUD_RATE), HandlerConfig::link);
    let session = if cli.instant {
        DryRunSession::instant()
    } else {
        DryRunSession::new()
    };
    let scheduler = Scheduler::new(session, link);

    let accepted = match &cli.command {
        Command::State { file } => read_payload(file)
            .and_then(|body| parse_state(&body))
            .map(|state| scheduler.submit_state(&state)),
        Command::Experiment { file } => read_payload(file)
            .and_then(|body| parse_experiment(&body))
            .map(|experiment| scheduler.submit_experiment(&experiment)),
    };
    if let Err(e) = accepted {
        tracing::error!(error = %e, "Command rejected");
        println!("{}", Receipt::rejected(&e).to_json());
        return ExitCode::FAILURE;
    }
    println!("{}", Receipt::received().to_json());

    while !matches!(scheduler.status(), SchedulerStatus::Idle | SchedulerStatus::Cancelled) {
        sleep(POLL_INTERVAL);
    }
    tracing::info!("All scheduled states played");
    ExitCode::SUCCESS
}
