//! GhostTyper suggestion backend.
//!
//! A thin axum service: completion generation against a generative-language
//! upstream, tone-profile CRUD over an opaque document store, and additive
//! telemetry aggregation. See [`routes::router`] for the HTTP surface.

pub mod config;
pub mod genai;
pub mod routes;
pub mod store;
pub mod tone;

use std::net::SocketAddr;

use anyhow::{Result, anyhow};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use config::ServerConfig;
pub use routes::{AppState, router};

/// Host configuration for a backend instance.
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and start serving; returns a handle for inspection and shutdown.
    pub async fn start(self) -> Result<RunningServer> {
        let state = AppState::from_config(self.config.clone())?;
        let app = router(state);

        let cancellation_token = CancellationToken::new();
        let listener = TcpListener::bind(self.config.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(%bound_address, "suggestion backend listening");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await;
            }
        });

        Ok(RunningServer {
            bound_address,
            cancellation_token,
            server_handle,
        })
    }
}

/// Runtime handle for a running backend.
#[derive(Debug)]
pub struct RunningServer {
    bound_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
}

impl RunningServer {
    /// The bound socket address.
    pub fn bound_address(&self) -> SocketAddr {
        self.bound_address
    }

    /// Stop the server and wait for it to finish.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.server_handle
            .await
            .map_err(|error| anyhow!("backend server task failed: {error}"))?;
        Ok(())
    }
}

/// Run the backend until interrupted.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let running = Server::new(config).start().await?;
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down suggestion backend");
    running.stop().await
}
