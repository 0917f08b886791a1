use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use small_filters::accel::HostPower;
use small_filters::config::{BenchConfig, LoggingConfig};
use small_filters::{catalog, Orchestrator, RunError, RunMode};

#[derive(Parser)]
#[command(
    name = "small-filters",
    about = "Run a bunch of small filters across HVX and CPU variants",
    version,
    long_about = None
)]
struct Cli {
    /// HVX mode to run. Default is to run hvx64, hvx128 and cpu
    #[arg(short = 'm', value_enum)]
    mode: Option<ModeArg>,

    /// Number of timed iterations
    #[arg(short = 'n')]
    iterations: Option<usize>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of progress lines
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Hvx64,
    Hvx128,
    Cpu,
}

impl From<ModeArg> for RunMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Hvx64 => RunMode::Hvx64,
            ModeArg::Hvx128 => RunMode::Hvx128,
            ModeArg::Cpu => RunMode::Cpu,
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    // Logs go to stderr; stdout carries the progress lines.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = BenchConfig::resolve(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let settings = config.settings(cli.mode.map(RunMode::from), cli.iterations);
    tracing::info!(?settings, "Running small filters");

    let pipelines = catalog::default_catalog(settings.width, settings.height)
        .context("failed to build pipeline catalog")?;
    let mut orchestrator = Orchestrator::new(pipelines, HostPower::new(), settings);

    let result = if cli.json {
        orchestrator.run(&mut io::sink())
    } else {
        orchestrator.run(&mut io::stdout().lock())
    };

    match result {
        Ok(report) => {
            if cli.json {
                println!("{}", report.to_json()?);
            }
            Ok(())
        }
        Err(RunError::VerificationFailed { pipeline, mode }) => {
            // A wrong answer invalidates every timing after it.
            tracing::error!(%pipeline, %mode, "verification failed, aborting");
            eprintln!("Verification failed: {} {}", pipeline, mode.label());
            std::process::abort();
        }
        Err(e) => Err(e.into()),
    }
}
