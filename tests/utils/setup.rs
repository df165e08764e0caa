use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::sync::{mpsc, Mutex};

use coedit::{
    auth,
    auth::repository::InMemoryUserRepository,
    document,
    document::invitations::InMemoryInvitationRepository,
    document::repository::InMemoryDocumentRepository,
    relay::{RelayFrame, RelayHandle, RelayService},
    shared::AppState,
    websockets::ConnectionManager,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Drives the relay pipeline the way production wires it: a spawned relay
/// task fanning out through a real `ConnectionManager`, with channel-backed
/// clients standing in for websocket connections.
pub struct RelayTestBed {
    pub relay: RelayHandle,
    pub connection_manager: Arc<ConnectionManager>,
    receivers: Mutex<HashMap<String, mpsc::UnboundedReceiver<String>>>,
}

impl RelayTestBed {
    pub fn new() -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let relay = RelayService::spawn(connection_manager.clone());

        Self {
            relay,
            connection_manager,
            receivers: Mutex::new(HashMap::new()),
        }
    }

    /// Every frame delivered to a connection since the last drain, oldest
    /// first. Panics if the connection was never opened through the bed.
    pub async fn drain_frames(&self, connection_id: &str) -> Vec<RelayFrame> {
        let mut receivers = self.receivers.lock().await;
        let receiver = receivers
            .get_mut(connection_id)
            .unwrap_or_else(|| panic!("{} was never connected", connection_id));

        let mut frames = vec![];
        while let Ok(raw) = receiver.try_recv() {
            let frame: RelayFrame = serde_json::from_str(&raw)
                .unwrap_or_else(|e| panic!("{} received unparseable frame: {}", connection_id, e));
            frames.push(frame);
        }
        frames
    }

    pub(crate) async fn track_receiver(
        &self,
        connection_id: &str,
        receiver: mpsc::UnboundedReceiver<String>,
    ) {
        self.receivers
            .lock()
            .await
            .insert(connection_id.to_string(), receiver);
    }
}

/// The HTTP surface assembled the same way `main` assembles it, backed by
/// in-memory repositories, for request-level workflow tests.
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let connection_manager = Arc::new(ConnectionManager::new());
        let relay = RelayService::spawn(connection_manager.clone());

        let state = AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryDocumentRepository::new()),
            Arc::new(InMemoryInvitationRepository::new()),
            connection_manager,
            relay,
        );

        let protected_routes = Router::new()
            .route(
                "/documents",
                get(document::list_documents).post(document::create_document),
            )
            .route(
                "/documents/:id",
                get(document::get_document).put(document::update_document),
            )
            .route(
                "/documents/:id/collaborators",
                put(document::add_collaborator).delete(document::remove_collaborator),
            )
            .route(
                "/documents/:id/invitations",
                post(document::invite_collaborator),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

        let router = Router::new()
            .route("/register", post(auth::register))
            .route("/login", post(auth::login))
            .merge(protected_routes)
            .with_state(state);

        Self { router }
    }
}
