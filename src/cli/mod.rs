//! CLI command handling.
//!
//! Provides subcommands for:
//! - Running the pairing gateway (`serve`, the default)
//! - Printing the resolved configuration (`config`)

use std::net::IpAddr;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::gateway::PairingServer;

#[derive(Parser, Debug)]
#[command(name = "vault-pairing")]
#[command(about = "One-time pairing code service for handing vault public keys to a second device")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "LOG_JSON")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the pairing gateway (default if no subcommand given)
    Serve {
        /// Address to bind (overrides GATEWAY_HOST)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to listen on (overrides GATEWAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the resolved configuration as JSON
    Config,
}

impl Cli {
    /// The subcommand to run, defaulting to `serve`.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }
}

/// Run a CLI command against an already loaded configuration.
pub async fn run_command(cmd: Command, mut config: Config) -> anyhow::Result<()> {
    match cmd {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            serve(config).await
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        code_ttl_ms = config.pairing.code_ttl.as_millis() as u64,
        create_limit = config.gateway.create_limit.max_requests,
        retrieve_limit = config.gateway.retrieve_limit.max_requests,
        fixtures = config.pairing.fixtures_enabled,
        "Starting pairing gateway"
    );

    let mut server = PairingServer::new(&config);
    server.start().await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
        }
        _ = server.wait() => {
            tracing::warn!("Pairing gateway stopped unexpectedly");
        }
    }

    server.shutdown().await;
    tracing::info!("Pairing gateway stopped");
    Ok(())
}
