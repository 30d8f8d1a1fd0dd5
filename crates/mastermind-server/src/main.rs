use mastermind_server::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the listen address.
const ADDR_VAR: &str = "MASTERMIND_ADDR";

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var(ADDR_VAR).unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let server = MastermindServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server.run().await
}
