//! Per-connection handler: decode intents in, encode pushes out.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Register the player with the hub, with a fresh outbound channel
//!   2. Spawn a writer task draining that channel onto the socket
//!   3. Loop: receive frames → decode → forward the intent to the hub
//!   4. On close, error or idle timeout: tell the hub the player is gone

use std::sync::Arc;
use std::time::Duration;

use mastermind_protocol::{ClientIntent, Codec, PlayerId, ServerPush};
use mastermind_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ServerError;
use crate::hub::HubHandle;

/// Text sent back for frames that are not a known intent.
const MALFORMED_MESSAGE: &str = "Malformed message";

/// Drop guard that tells the hub the player is gone when the handler
/// exits, even on an early `?` return.
///
/// `Drop` is synchronous, so it spawns a fire-and-forget task for the
/// async send.
struct DisconnectGuard {
    player_id: PlayerId,
    hub: HubHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let _ = hub.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    hub: HubHandle,
    codec: C,
    idle_timeout: Option<Duration>,
) -> Result<(), ServerError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::debug!(%conn_id, %player_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, mut pushes) = mpsc::unbounded_channel::<ServerPush>();
    hub.connect(player_id, outbound.clone()).await?;
    let _guard = DisconnectGuard {
        player_id,
        hub: hub.clone(),
    };

    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        let codec = codec.clone();
        async move {
            while let Some(push) = pushes.recv().await {
                let bytes = match codec.encode(&push) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%player_id, error = %e, "failed to encode push");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
                    break;
                }
            }
        }
    });

    loop {
        let received = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%player_id, "connection idle, closing");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let intent: ClientIntent = match codec.decode(&data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode intent");
                let _ = outbound.send(ServerPush::Error(MALFORMED_MESSAGE.into()));
                continue;
            }
        };

        hub.intent(player_id, intent).await?;
    }

    writer.abort();
    let _ = conn.close().await;
    Ok(())
}
