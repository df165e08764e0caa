use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{DocumentKind, DocumentModel};
use crate::auth::UserSummary;

/// Request body for POST /documents
#[derive(Debug, Deserialize)]
pub struct DocumentCreateRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub kind: DocumentKind,
    pub comments: Option<String>,
}

/// Request body for PUT /documents/:id
#[derive(Debug, Deserialize)]
pub struct DocumentUpdateRequest {
    pub title: String,
    pub content: String,
    pub comments: Option<String>,
}

/// Request body for collaborator and invitation endpoints
#[derive(Debug, Deserialize)]
pub struct CollaboratorRequest {
    pub email: String,
}

/// A document with its owner and collaborators resolved to profiles
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: DocumentKind,
    pub comments: Option<String>,
    pub owner: UserSummary,
    pub collaborators: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn from_model(
        model: DocumentModel,
        owner: UserSummary,
        collaborators: Vec<UserSummary>,
    ) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            kind: model.kind,
            comments: model.comments,
            owner,
            collaborators,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response for POST /documents/:id/invitations
#[derive(Debug, Serialize, Deserialize)]
pub struct InviteResponse {
    pub document_id: String,
    pub email: String,
    /// True when the email already had an account and was added as a
    /// collaborator directly; false when an invitation was parked.
    pub added_as_collaborator: bool,
}
