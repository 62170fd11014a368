//! Pairing gateway server lifecycle.
//!
//! Binds the listener, serves the pairing router, and runs the expiry
//! sweeper next to it until shutdown.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::{GatewayState, router};
use crate::pairing::PairingSweeper;

/// The pairing HTTP server plus its background sweeper.
pub struct PairingServer {
    addr: SocketAddr,
    state: GatewayState,
    sweep_interval: Duration,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    sweeper: Option<JoinHandle<()>>,
}

impl PairingServer {
    /// Create a server with fresh services built from `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_state(
            config.gateway.addr(),
            GatewayState::from_config(config),
            config.pairing.sweep_interval,
        )
    }

    /// Create a server around existing services.
    pub fn with_state(addr: SocketAddr, state: GatewayState, sweep_interval: Duration) -> Self {
        Self {
            addr,
            state,
            sweep_interval,
            local_addr: None,
            shutdown_tx: None,
            handle: None,
            sweeper: None,
        }
    }

    /// Services shared with the running handlers.
    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Bind the listener, then spawn the server and sweeper tasks.
    pub async fn start(&mut self) -> Result<SocketAddr, GatewayError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::StartupFailed {
                reason: format!("Failed to bind to {}: {}", self.addr, e),
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::StartupFailed {
                reason: format!("Failed to read bound address: {}", e),
            })?;

        tracing::info!("Pairing gateway listening on {}", local_addr);

        let app = router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Pairing gateway shutting down");
                })
                .await
            {
                tracing::error!("Pairing gateway error: {}", e);
            }
        });

        let sweeper = PairingSweeper::new(self.state.store.clone(), self.sweep_interval)
            .with_limiter(self.state.create_limiter.clone())
            .with_limiter(self.state.retrieve_limiter.clone())
            .spawn();

        self.handle = Some(handle);
        self.sweeper = Some(sweeper);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Wait until the server task exits on its own.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.await;
            self.handle = None;
        }
    }

    /// Signal graceful shutdown, stop the sweeper, and wait for the server.
    pub async fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_config() -> Config {
        let mut config = Config::default();
        config.gateway.port = 0;
        config
    }

    #[tokio::test]
    async fn start_and_shutdown_lifecycle() {
        let mut server = PairingServer::new(&auto_config());
        let addr = server.start().await.expect("server should start on port 0");
        assert_ne!(addr.port(), 0);
        assert_eq!(server.local_addr(), Some(addr));
        assert!(server.handle.is_some());
        assert!(server.sweeper.is_some());

        server.shutdown().await;
        assert!(server.handle.is_none());
        assert!(server.shutdown_tx.is_none());
        assert!(server.sweeper.is_none());
    }

    #[tokio::test]
    async fn serves_health_over_tcp() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut server = PairingServer::new(&auto_config());
        let addr = server.start().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
        assert!(response.contains("\"status\":\"ok\""));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn start_on_occupied_port_returns_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let occupied = listener.local_addr().unwrap();

        let mut server = PairingServer::with_state(
            occupied,
            GatewayState::from_config(&Config::default()),
            Duration::from_secs(60),
        );
        match server.start().await.unwrap_err() {
            GatewayError::StartupFailed { reason } => {
                assert!(reason.contains("Failed to bind"));
            }
        }
        assert!(server.handle.is_none());
    }

    #[tokio::test]
    async fn shutdown_when_not_started_is_noop() {
        let mut server = PairingServer::new(&auto_config());
        server.shutdown().await;
    }
}
