use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::{AuthClaims, AuthService};
use crate::relay::{RelayFrame, RelayHandle};
use crate::shared::{AppError, AppState};

use super::socket::{Connection, MessageHandler};

/// Decodes inbound text into relay frames and forwards them.
///
/// Anything that fails to decode, unknown event names included, is
/// protocol noise: logged at debug and dropped while the connection
/// stays up.
pub struct RelayReceiveHandler {
    relay: RelayHandle,
}

impl RelayReceiveHandler {
    pub fn new(relay: RelayHandle) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl MessageHandler for RelayReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        match serde_json::from_str::<RelayFrame>(&message) {
            Ok(frame) => {
                debug!(
                    connection_id = %connection_id,
                    event = frame.event.event_name(),
                    "Received relay frame"
                );
                self.relay.frame(connection_id, frame);
            }
            Err(e) => {
                debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Unrecognized message, dropping"
                );
            }
        }
    }
}

/// WebSocket endpoint that handles authentication via Sec-WebSocket-Protocol header
/// GET /ws with JWT token in Sec-WebSocket-Protocol header
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!("WebSocket connection requested");

    // Extract JWT from Sec-WebSocket-Protocol header
    let jwt_token = headers
        .get("sec-websocket-protocol")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing or invalid Sec-WebSocket-Protocol header");
            AppError::Unauthorized("Missing authentication token".to_string())
        })?;

    let auth_service = AuthService::new(
        Arc::clone(&app_state.user_repository),
        Arc::clone(&app_state.document_repository),
        Arc::clone(&app_state.invitation_repository),
    );
    let claims = auth_service.validate_token(jwt_token).await?;

    info!(
        user_id = %claims.user_id,
        "WebSocket authentication successful"
    );

    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, claims, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    claims: AuthClaims,
    app_state: AppState,
) {
    // Connection identity is per socket, not per user: the same user
    // editing in two tabs is two relay connections.
    let connection_id = uuid::Uuid::new_v4().to_string();

    info!(
        connection_id = %connection_id,
        user_id = %claims.user_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    // Register with the connection manager first so relay fan-out can
    // reach this connection as soon as it is attached.
    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender);
    app_state.relay.connect(&connection_id);

    let message_handler = Arc::new(RelayReceiveHandler::new(app_state.relay.clone()));

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                connection_id = %connection_id,
                user_id = %claims.user_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                user_id = %claims.user_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: remove from connection manager, then detach from relay
    app_state
        .connection_manager
        .remove_connection(&connection_id);
    app_state.relay.disconnect(&connection_id);

    info!(
        connection_id = %connection_id,
        user_id = %claims.user_id,
        "WebSocket connection cleaned up"
    );
}
