use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::repository::UserRepository;
use crate::document::invitations::InvitationRepository;
use crate::document::repository::DocumentRepository;
use crate::relay::RelayHandle;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub document_repository: Arc<dyn DocumentRepository + Send + Sync>,
    pub invitation_repository: Arc<dyn InvitationRepository + Send + Sync>,
    pub connection_manager: Arc<ConnectionManager>,
    pub relay: RelayHandle,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        document_repository: Arc<dyn DocumentRepository + Send + Sync>,
        invitation_repository: Arc<dyn InvitationRepository + Send + Sync>,
        connection_manager: Arc<ConnectionManager>,
        relay: RelayHandle,
    ) -> Self {
        Self {
            user_repository,
            document_repository,
            invitation_repository,
            connection_manager,
            relay,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::repository::InMemoryUserRepository;
    use crate::document::invitations::InMemoryInvitationRepository;
    use crate::document::repository::InMemoryDocumentRepository;
    use crate::relay::RelayService;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        user_repository: Option<Arc<dyn UserRepository + Send + Sync>>,
        document_repository: Option<Arc<dyn DocumentRepository + Send + Sync>>,
        invitation_repository: Option<Arc<dyn InvitationRepository + Send + Sync>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                user_repository: None,
                document_repository: None,
                invitation_repository: None,
            }
        }

        pub fn with_user_repository(mut self, repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
            self.user_repository = Some(repo);
            self
        }

        pub fn with_document_repository(
            mut self,
            repo: Arc<dyn DocumentRepository + Send + Sync>,
        ) -> Self {
            self.document_repository = Some(repo);
            self
        }

        pub fn with_invitation_repository(
            mut self,
            repo: Arc<dyn InvitationRepository + Send + Sync>,
        ) -> Self {
            self.invitation_repository = Some(repo);
            self
        }

        /// Builds an AppState backed by in-memory repositories and a
        /// freshly spawned relay task. Needs a tokio runtime.
        pub fn build(self) -> AppState {
            let connection_manager = Arc::new(ConnectionManager::new());
            let relay = RelayService::spawn(connection_manager.clone());

            AppState {
                user_repository: self
                    .user_repository
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                document_repository: self
                    .document_repository
                    .unwrap_or_else(|| Arc::new(InMemoryDocumentRepository::new())),
                invitation_repository: self
                    .invitation_repository
                    .unwrap_or_else(|| Arc::new(InMemoryInvitationRepository::new())),
                connection_manager,
                relay,
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
