use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use beacon_workers::{config, run, shutdown};

#[derive(Parser)]
#[command(name = "beacon-worker", version, about = "Beacon aggregation worker")]
struct Args {
    #[arg(short, long, help = "Path to worker config file")]
    config: PathBuf,
}

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let args = Args::parse();
    let cfg = match config::load_from_file(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(path = %args.config.display(), error = %e, "invalid config");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "beacon worker starting");
    let input = BufReader::new(tokio::io::stdin());
    match run::run_blocking(cfg, input, shutdown::wait_for_shutdown(), SHUTDOWN_GRACE) {
        Ok(report) => {
            tracing::info!(accepted = report.accepted, rejected = report.rejected, "bye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "worker failed");
            ExitCode::FAILURE
        }
    }
}
