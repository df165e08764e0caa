use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tower::ServiceExt; // for `oneshot`

use coedit::relay::RelayFrame;

use super::setup::{RelayTestBed, TestApp};

// ============================================================================
// Relay Action Helpers
// ============================================================================

impl RelayTestBed {
    /// Open a fake client: register its outbound channel and announce the
    /// connection to the relay, the same order the websocket handler uses.
    pub async fn connect(&self, connection_id: &str) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connection_manager
            .add_connection(connection_id.to_string(), sender);
        self.track_receiver(connection_id, receiver).await;
        self.relay.connect(connection_id);
        self.settle().await;
    }

    /// Tear a client down the way the websocket handler does on socket
    /// close: transport first, then the relay.
    pub async fn disconnect(&self, connection_id: &str) {
        self.connection_manager.remove_connection(connection_id);
        self.relay.disconnect(connection_id);
        self.settle().await;
    }

    pub async fn join(&self, connection_id: &str, room_id: &str) {
        self.send_frame(connection_id, RelayFrame::join(room_id)).await;
    }

    pub async fn send_content(&self, connection_id: &str, payload: Value) {
        self.send_frame(connection_id, RelayFrame::doc_content(payload))
            .await;
    }

    pub async fn send_comment(&self, connection_id: &str, payload: Value) {
        self.send_frame(connection_id, RelayFrame::new_comment(payload))
            .await;
    }

    /// Send a frame and wait for the relay task to process it
    pub async fn send_frame(&self, connection_id: &str, frame: RelayFrame) {
        self.relay.frame(connection_id, frame);
        self.settle().await;
    }

    /// Give the relay task a beat to drain its queue
    pub async fn settle(&self) {
        sleep(Duration::from_millis(10)).await;
    }

    /// Discard everything delivered so far
    pub async fn clear_frames(&self, connection_id: &str) {
        self.drain_frames(connection_id).await;
    }
}

// ============================================================================
// HTTP Action Helpers
// ============================================================================

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|e| panic!("{} {} returned non-JSON body: {}", method, uri, e))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn delete_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, Some(body)).await
    }

    // ========================================================================
    // Convenience Action Methods
    // ========================================================================

    pub async fn register_user(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/register",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login_user(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Register a user and hand back their bearer token
    pub async fn signup(&self, email: &str) -> String {
        let (status, body) = self.register_user(email, "a-long-password").await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a document and hand back its id
    pub async fn create_document(&self, token: &str, title: &str, content: &str) -> String {
        let (status, body) = self
            .post_json(
                "/documents",
                Some(token),
                json!({ "title": title, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}
