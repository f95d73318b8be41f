//! `SkyliftServer` builder and accept loop.
//!
//! This is the entry point for running a crash-game table. It ties
//! together all the layers: socket → protocol → engine → broadcast.

use std::sync::Arc;

use skylift_broadcast::Broadcaster;
use skylift_engine::{EngineConfig, EngineHandle, spawn_engine};
use skylift_ledger::InMemoryLedger;
use skylift_protocol::{JsonCodec, Snapshot};
use tokio::net::TcpListener;

use crate::SkyliftError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All fields
/// are already internally synchronized, so no outer lock is needed.
pub(crate) struct ServerState {
    pub(crate) engine: EngineHandle,
    pub(crate) broadcaster: Arc<Broadcaster<Snapshot>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Skylift server.
///
/// # Example
///
/// ```rust,ignore
/// let server = SkyliftServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SkyliftServerBuilder {
    bind_addr: String,
    engine_config: EngineConfig,
}

impl SkyliftServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            engine_config: EngineConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the round engine configuration.
    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Binds the listener and spawns the round engine.
    ///
    /// The engine starts its first betting window immediately; the accept
    /// loop does not run until [`SkyliftServer::run`] is called.
    pub async fn build(self) -> Result<SkyliftServer, SkyliftError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listener bound");

        let ledger = Arc::new(InMemoryLedger::new());
        let broadcaster = Arc::new(Broadcaster::new());
        let engine = spawn_engine(
            self.engine_config,
            Arc::clone(&ledger),
            Arc::clone(&broadcaster),
        );

        let state = Arc::new(ServerState {
            engine,
            broadcaster,
            codec: JsonCodec,
        });

        Ok(SkyliftServer {
            listener,
            ledger,
            state,
        })
    }
}

impl Default for SkyliftServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Skylift crash-game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkyliftServer {
    listener: TcpListener,
    ledger: Arc<InMemoryLedger>,
    state: Arc<ServerState>,
}

impl SkyliftServer {
    /// Creates a new builder.
    pub fn builder() -> SkyliftServerBuilder {
        SkyliftServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The ledger backing this table. Useful for seeding demo balances
    /// before the first clients connect.
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// A handle to the round engine driving this table.
    pub fn engine(&self) -> EngineHandle {
        self.state.engine.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// client. Runs until the process is terminated.
    pub async fn run(self) -> Result<(), SkyliftError> {
        tracing::info!("skylift server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, state).await {
                            tracing::debug!(%addr, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
