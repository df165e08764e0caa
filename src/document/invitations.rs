use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::InvitationModel;
use crate::shared::AppError;

/// Trait for invitation repository operations
///
/// Deleting an invitation that is already gone is a no-op: the same
/// invitation can be consumed by registration while someone re-invites
/// the address, and neither path should fail for it.
#[async_trait]
pub trait InvitationRepository {
    async fn create_invitation(&self, invitation: &InvitationModel) -> Result<(), AppError>;
    async fn list_for_email(&self, email: &str) -> Result<Vec<InvitationModel>, AppError>;
    async fn delete_invitation(&self, invitation_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of InvitationRepository for development and testing
pub struct InMemoryInvitationRepository {
    invitations: Mutex<HashMap<String, InvitationModel>>,
}

impl Default for InMemoryInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInvitationRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            invitations: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of invitations in the repository
    pub fn invitation_count(&self) -> usize {
        self.invitations.lock().unwrap().len()
    }
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    #[instrument(skip(self, invitation))]
    async fn create_invitation(&self, invitation: &InvitationModel) -> Result<(), AppError> {
        debug!(
            invitation_id = %invitation.id,
            document_id = %invitation.document_id,
            email = %invitation.email,
            "Creating invitation in memory"
        );

        let mut invitations = self.invitations.lock().unwrap();
        invitations.insert(invitation.id.clone(), invitation.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_email(&self, email: &str) -> Result<Vec<InvitationModel>, AppError> {
        debug!(email = %email, "Listing invitations for email from memory");

        let invitations = self.invitations.lock().unwrap();
        Ok(invitations
            .values()
            .filter(|invitation| invitation.email == email)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_invitation(&self, invitation_id: &str) -> Result<(), AppError> {
        debug!(invitation_id = %invitation_id, "Deleting invitation from memory");

        let mut invitations = self.invitations.lock().unwrap();
        if invitations.remove(invitation_id).is_none() {
            debug!(invitation_id = %invitation_id, "Invitation already gone");
        }
        Ok(())
    }
}

/// PostgreSQL implementation of invitation repository
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    #[instrument(skip(self, invitation))]
    async fn create_invitation(&self, invitation: &InvitationModel) -> Result<(), AppError> {
        debug!(
            invitation_id = %invitation.id,
            document_id = %invitation.document_id,
            "Creating invitation in database"
        );

        sqlx::query(
            "INSERT INTO invitations (id, document_id, email, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&invitation.id)
        .bind(&invitation.document_id)
        .bind(&invitation.email)
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create invitation in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_email(&self, email: &str) -> Result<Vec<InvitationModel>, AppError> {
        debug!(email = %email, "Listing invitations for email from database");

        let rows = sqlx::query(
            "SELECT id, document_id, email, created_at FROM invitations WHERE email = $1",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list invitations from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| InvitationModel {
                id: row.get("id"),
                document_id: row.get("document_id"),
                email: row.get("email"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_invitation(&self, invitation_id: &str) -> Result<(), AppError> {
        debug!(invitation_id = %invitation_id, "Deleting invitation from database");

        sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(invitation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete invitation from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
