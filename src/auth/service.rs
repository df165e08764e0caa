use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::UserModel,
    repository::UserRepository,
    token::TokenConfig,
    types::{AuthClaims, AuthResponse},
};
use crate::document::invitations::InvitationRepository;
use crate::document::repository::{CollaboratorUpdateResult, DocumentRepository};
use crate::shared::AppError;

/// Service for account and token business logic
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    documents: Arc<dyn DocumentRepository + Send + Sync>,
    invitations: Arc<dyn InvitationRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        documents: Arc<dyn DocumentRepository + Send + Sync>,
        invitations: Arc<dyn InvitationRepository + Send + Sync>,
    ) -> Self {
        Self {
            users,
            documents,
            invitations,
            token_config: TokenConfig::new(),
        }
    }

    /// Creates a new account, applies any invitations that were waiting
    /// for this email, and returns a fresh token.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.users.get_user_by_email(email).await?.is_some() {
            warn!(email = %email, "Registration attempt for existing email");
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::Internal
        })?;

        let user = UserModel::new(email.to_string(), password_hash);
        self.users.create_user(&user).await?;

        self.apply_pending_invitations(&user).await?;

        let token = self
            .token_config
            .create_token(user.id.clone(), user.email.clone())?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(AuthResponse {
            token,
            user: user.summary(),
        })
    }

    /// Turns invitations addressed to this email into collaborator
    /// entries on the invited documents, then deletes them.
    async fn apply_pending_invitations(&self, user: &UserModel) -> Result<(), AppError> {
        let pending = self.invitations.list_for_email(&user.email).await?;
        if pending.is_empty() {
            return Ok(());
        }

        info!(
            user_id = %user.id,
            invitation_count = pending.len(),
            "Applying pending invitations for new user"
        );

        for invitation in pending {
            match self
                .documents
                .add_collaborator(&invitation.document_id, &user.id)
                .await?
            {
                CollaboratorUpdateResult::Updated(_) => info!(
                    user_id = %user.id,
                    document_id = %invitation.document_id,
                    "Invitation applied, user added as collaborator"
                ),
                CollaboratorUpdateResult::DocumentNotFound => warn!(
                    document_id = %invitation.document_id,
                    "Invited document no longer exists, dropping invitation"
                ),
            }
            self.invitations.delete_invitation(&invitation.id).await?;
        }

        Ok(())
    }

    /// Verifies the credentials and returns a fresh token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "Login attempt for unknown email");
                AppError::Unauthorized("Invalid email or password".to_string())
            })?;

        let password_valid = bcrypt::verify(password, &user.password_hash).map_err(|e| {
            warn!(error = %e, "Failed to verify password hash");
            AppError::Internal
        })?;

        if !password_valid {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self
            .token_config
            .create_token(user.id.clone(), user.email.clone())?;

        info!(user_id = %user.id, "User logged in");
        Ok(AuthResponse {
            token,
            user: user.summary(),
        })
    }

    /// Validates a token and checks the account still exists.
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        let claims = self.token_config.validate_token(token)?;

        match self.users.get_user_by_id(&claims.user_id).await? {
            Some(_) => Ok(claims),
            None => {
                warn!(user_id = %claims.user_id, "Token for deleted user");
                Err(AppError::Unauthorized("User no longer exists".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::InMemoryUserRepository;
    use crate::document::invitations::{InMemoryInvitationRepository, InvitationRepository};
    use crate::document::models::{DocumentKind, DocumentModel, InvitationModel};
    use crate::document::repository::InMemoryDocumentRepository;

    struct TestHarness {
        service: AuthService,
        documents: Arc<InMemoryDocumentRepository>,
        invitations: Arc<InMemoryInvitationRepository>,
    }

    fn harness() -> TestHarness {
        let users = Arc::new(InMemoryUserRepository::new());
        let documents = Arc::new(InMemoryDocumentRepository::new());
        let invitations = Arc::new(InMemoryInvitationRepository::new());
        let service = AuthService::new(users, documents.clone(), invitations.clone());
        TestHarness {
            service,
            documents,
            invitations,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let harness = harness();

        let registered = harness
            .service
            .register("alice@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert!(!registered.token.is_empty());
        assert!(registered.token.contains('.'));
        assert_eq!(registered.user.email, "alice@example.com");

        let logged_in = harness
            .service
            .login("alice@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let harness = harness();

        let result = harness.service.register("not-an-email", "hunter2hunter2").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let harness = harness();

        let result = harness.service.register("alice@example.com", "short").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let harness = harness();

        harness
            .service
            .register("alice@example.com", "hunter2hunter2")
            .await
            .unwrap();
        let result = harness
            .service
            .register("alice@example.com", "other-password")
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let harness = harness();

        harness
            .service
            .register("alice@example.com", "hunter2hunter2")
            .await
            .unwrap();
        let result = harness
            .service
            .login("alice@example.com", "wrong-password")
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_with_unknown_email() {
        let harness = harness();

        let result = harness
            .service
            .login("ghost@example.com", "hunter2hunter2")
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_validate_token_round_trip() {
        let harness = harness();

        let registered = harness
            .service
            .register("alice@example.com", "hunter2hunter2")
            .await
            .unwrap();

        let claims = harness
            .service
            .validate_token(&registered.token)
            .await
            .unwrap();
        assert_eq!(claims.user_id, registered.user.id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_validate_token_for_unknown_user() {
        let harness = harness();

        // Token signed with the right secret but for an account that
        // was never created.
        let token = TokenConfig::new()
            .create_token("ghost-user".to_string(), "ghost@example.com".to_string())
            .unwrap();

        let result = harness.service.validate_token(&token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_validate_garbage_token() {
        let harness = harness();

        let result = harness.service.validate_token("not.a.token").await;
        assert!(matches!(result, Err(AppError::JwtError(_))));
    }

    #[tokio::test]
    async fn test_register_applies_pending_invitations() {
        let harness = harness();

        let document = DocumentModel::new(
            "owner-1".to_string(),
            "Notes".to_string(),
            "content".to_string(),
            DocumentKind::Text,
            None,
        );
        harness.documents.create_document(&document).await.unwrap();
        harness
            .invitations
            .create_invitation(&InvitationModel::new(
                document.id.clone(),
                "bob@example.com".to_string(),
            ))
            .await
            .unwrap();

        let registered = harness
            .service
            .register("bob@example.com", "hunter2hunter2")
            .await
            .unwrap();

        let stored = harness
            .documents
            .get_document(&document.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.collaborator_ids.contains(&registered.user.id));

        let remaining = harness
            .invitations
            .list_for_email("bob@example.com")
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_register_survives_invitation_to_deleted_document() {
        let harness = harness();

        harness
            .invitations
            .create_invitation(&InvitationModel::new(
                "vanished-doc".to_string(),
                "bob@example.com".to_string(),
            ))
            .await
            .unwrap();

        let result = harness
            .service
            .register("bob@example.com", "hunter2hunter2")
            .await;

        assert!(result.is_ok());
        let remaining = harness
            .invitations
            .list_for_email("bob@example.com")
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
