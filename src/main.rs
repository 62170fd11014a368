//! vault-pairing binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vault_pairing::cli::{Cli, run_command};
use vault_pairing::config::Config;

const DEFAULT_LOG_FILTER: &str = "vault_pairing=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap so env-backed flags see it.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env()?;
    run_command(cli.resolved_command(), config).await
}
