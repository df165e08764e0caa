use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// What the editor renders the document as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Text,
    Code,
}

/// Database model for the documents table
///
/// Collaborators are stored as a list of user ids next to the owner id;
/// access is owner-or-collaborator with no finer distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentModel {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: DocumentKind,
    pub comments: Option<String>,
    pub owner_id: String,
    pub collaborator_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentModel {
    pub fn new(
        owner_id: String,
        title: String,
        content: String,
        kind: DocumentKind,
        comments: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            kind,
            comments,
            owner_id,
            collaborator_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_collaborator(&self, user_id: &str) -> bool {
        self.collaborator_ids.iter().any(|id| id == user_id)
    }

    /// Owner and collaborators have identical access.
    pub fn has_access(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.is_collaborator(user_id)
    }

    /// Set-style add that returns whether the id was newly inserted.
    pub fn add_collaborator(&mut self, user_id: &str) -> bool {
        if self.is_collaborator(user_id) {
            return false;
        }
        self.collaborator_ids.push(user_id.to_string());
        true
    }

    /// Set-style remove that returns whether the id was present.
    pub fn remove_collaborator(&mut self, user_id: &str) -> bool {
        let before = self.collaborator_ids.len();
        self.collaborator_ids.retain(|id| id != user_id);
        self.collaborator_ids.len() != before
    }
}

/// Database model for the invitations table
///
/// An invitation parks collaborator access for an email address that has
/// no account yet; registration consumes it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvitationModel {
    pub id: String,
    pub document_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl InvitationModel {
    pub fn new(document_id: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id,
            email,
            created_at: Utc::now(),
        }
    }
}
