//! `MastermindServer` builder and accept loop.
//!
//! This is the entry point for running a room server. It ties the layers
//! together: transport → handler (protocol) → hub (core).

use std::net::SocketAddr;
use std::time::Duration;

use mastermind_core::GameTimings;
use mastermind_protocol::{Codec, JsonCodec};
use mastermind_transport::{Transport, WebSocketTransport};

use crate::ServerError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;
use crate::hub::{Hub, HubHandle};

/// Builder for configuring and starting a Mastermind server.
///
/// # Example
///
/// ```rust,no_run
/// use mastermind_server::prelude::*;
///
/// # async fn run() -> Result<(), ServerError> {
/// let server = MastermindServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MastermindServerBuilder {
    config: ServerConfig,
}

impl MastermindServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the panic window, CPU think time and speed-run limit.
    pub fn timings(mut self, timings: GameTimings) -> Self {
        self.config.timings = timings;
        self
    }

    /// Sets how long a silent connection is kept. `None` disables the limit.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and starts the game hub.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<MastermindServer<JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let hub = Hub::spawn(self.config.timings.clone());

        Ok(MastermindServer {
            transport,
            hub,
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        })
    }
}

/// A running Mastermind room server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MastermindServer<C: Codec> {
    transport: WebSocketTransport,
    hub: HubHandle,
    codec: C,
    idle_timeout: Option<Duration>,
}

impl MastermindServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> MastermindServerBuilder {
        MastermindServerBuilder::new()
    }
}

impl<C> MastermindServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "mastermind server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let hub = self.hub.clone();
                    let codec = self.codec.clone();
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, hub, codec, idle_timeout).await {
                            tracing::debug!(error = %e, "connection ended with error");
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
