use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    invitations::InvitationRepository,
    models::{DocumentModel, InvitationModel},
    repository::{
        CollaboratorUpdateResult, DocumentRepository, DocumentUpdate, UpdateDocumentResult,
    },
    types::{DocumentCreateRequest, DocumentResponse, DocumentUpdateRequest, InviteResponse},
};
use crate::auth::repository::UserRepository;
use crate::auth::UserSummary;
use crate::shared::AppError;

/// How a caller wants to use a document. Owners and collaborators
/// currently get both levels, but callers state their intent so the
/// policy can tighten without touching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Write,
}

/// Service for document business logic
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    invitations: Arc<dyn InvitationRepository + Send + Sync>,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        invitations: Arc<dyn InvitationRepository + Send + Sync>,
    ) -> Self {
        Self {
            documents,
            users,
            invitations,
        }
    }

    /// Every document the user owns or collaborates on.
    #[instrument(skip(self))]
    pub async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentResponse>, AppError> {
        let models = self.documents.list_documents_for_user(user_id).await?;

        let mut responses = Vec::with_capacity(models.len());
        for model in models {
            responses.push(self.to_response(model).await?);
        }

        debug!(user_id = %user_id, document_count = responses.len(), "Listed documents");
        Ok(responses)
    }

    #[instrument(skip(self))]
    pub async fn get_document(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<DocumentResponse, AppError> {
        let model = self.require_access(user_id, document_id).await?;
        self.to_response(model).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_document(
        &self,
        user_id: &str,
        request: DocumentCreateRequest,
    ) -> Result<DocumentResponse, AppError> {
        validate_fields(&request.title, &request.content)?;

        let model = DocumentModel::new(
            user_id.to_string(),
            request.title,
            request.content,
            request.kind,
            request.comments,
        );
        self.documents.create_document(&model).await?;

        info!(
            document_id = %model.id,
            owner_id = %user_id,
            kind = %model.kind,
            "Document created"
        );
        self.to_response(model).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_document(
        &self,
        user_id: &str,
        document_id: &str,
        request: DocumentUpdateRequest,
    ) -> Result<DocumentResponse, AppError> {
        validate_fields(&request.title, &request.content)?;
        self.require_access(user_id, document_id).await?;

        let update = DocumentUpdate {
            title: request.title,
            content: request.content,
            comments: request.comments,
        };
        match self.documents.update_document(document_id, update).await? {
            UpdateDocumentResult::Updated(model) => {
                info!(document_id = %document_id, user_id = %user_id, "Document updated");
                self.to_response(model).await
            }
            UpdateDocumentResult::NotFound => {
                Err(AppError::NotFound("Document not found".to_string()))
            }
        }
    }

    /// Adds an existing user as a collaborator, looked up by email.
    #[instrument(skip(self))]
    pub async fn add_collaborator(
        &self,
        user_id: &str,
        document_id: &str,
        email: &str,
    ) -> Result<DocumentResponse, AppError> {
        let document = self.require_access(user_id, document_id).await?;

        let target = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No user with that email".to_string()))?;

        if document.is_owner(&target.id) {
            return Err(AppError::Validation(
                "Owner already has full access".to_string(),
            ));
        }

        match self
            .documents
            .add_collaborator(document_id, &target.id)
            .await?
        {
            CollaboratorUpdateResult::Updated(model) => {
                info!(
                    document_id = %document_id,
                    collaborator_id = %target.id,
                    "Collaborator added"
                );
                self.to_response(model).await
            }
            CollaboratorUpdateResult::DocumentNotFound => {
                Err(AppError::NotFound("Document not found".to_string()))
            }
        }
    }

    /// Removes a collaborator by email. Removing someone who is not a
    /// collaborator succeeds and changes nothing.
    #[instrument(skip(self))]
    pub async fn remove_collaborator(
        &self,
        user_id: &str,
        document_id: &str,
        email: &str,
    ) -> Result<DocumentResponse, AppError> {
        self.require_access(user_id, document_id).await?;

        let target = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No user with that email".to_string()))?;

        match self
            .documents
            .remove_collaborator(document_id, &target.id)
            .await?
        {
            CollaboratorUpdateResult::Updated(model) => {
                info!(
                    document_id = %document_id,
                    collaborator_id = %target.id,
                    "Collaborator removed"
                );
                self.to_response(model).await
            }
            CollaboratorUpdateResult::DocumentNotFound => {
                Err(AppError::NotFound("Document not found".to_string()))
            }
        }
    }

    /// Shares a document with an email address. If the address already
    /// has an account the user becomes a collaborator immediately,
    /// otherwise an invitation waits for them to register.
    #[instrument(skip(self))]
    pub async fn invite_collaborator(
        &self,
        user_id: &str,
        document_id: &str,
        email: &str,
    ) -> Result<InviteResponse, AppError> {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }

        let document = self.require_access(user_id, document_id).await?;

        match self.users.get_user_by_email(email).await? {
            Some(target) => {
                if document.is_owner(&target.id) {
                    return Err(AppError::Validation(
                        "Owner already has full access".to_string(),
                    ));
                }
                self.documents
                    .add_collaborator(document_id, &target.id)
                    .await?;
                info!(
                    document_id = %document_id,
                    collaborator_id = %target.id,
                    "Invited user already registered, added as collaborator"
                );
                Ok(InviteResponse {
                    document_id: document_id.to_string(),
                    email: email.to_string(),
                    added_as_collaborator: true,
                })
            }
            None => {
                let invitation =
                    InvitationModel::new(document_id.to_string(), email.to_string());
                self.invitations.create_invitation(&invitation).await?;
                info!(
                    document_id = %document_id,
                    invitation_id = %invitation.id,
                    "No account for email yet, invitation stored"
                );
                Ok(InviteResponse {
                    document_id: document_id.to_string(),
                    email: email.to_string(),
                    added_as_collaborator: false,
                })
            }
        }
    }

    /// Answers whether a user may access a document at the given level.
    /// Missing documents yield false rather than an error, so callers
    /// can treat "no" and "gone" the same way.
    #[instrument(skip(self))]
    pub async fn check_access(
        &self,
        user_id: &str,
        document_id: &str,
        level: AccessLevel,
    ) -> Result<bool, AppError> {
        let allowed = self
            .documents
            .get_document(document_id)
            .await?
            .map(|document| document.has_access(user_id))
            .unwrap_or(false);

        debug!(
            user_id = %user_id,
            document_id = %document_id,
            level = ?level,
            allowed,
            "Access check"
        );
        Ok(allowed)
    }

    /// Loads the document and verifies the caller may touch it.
    async fn require_access(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<DocumentModel, AppError> {
        let document = self
            .documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if !document.has_access(user_id) {
            warn!(
                user_id = %user_id,
                document_id = %document_id,
                "Access denied to document"
            );
            return Err(AppError::Forbidden(
                "No access to this document".to_string(),
            ));
        }

        Ok(document)
    }

    /// Resolves owner and collaborator ids to public profiles.
    async fn to_response(&self, model: DocumentModel) -> Result<DocumentResponse, AppError> {
        let owner = match self.users.get_user_by_id(&model.owner_id).await? {
            Some(user) => user.summary(),
            None => {
                warn!(
                    document_id = %model.id,
                    owner_id = %model.owner_id,
                    "Document owner has no user record"
                );
                UserSummary {
                    id: model.owner_id.clone(),
                    email: String::new(),
                }
            }
        };

        let mut collaborators = Vec::with_capacity(model.collaborator_ids.len());
        for collaborator_id in &model.collaborator_ids {
            match self.users.get_user_by_id(collaborator_id).await? {
                Some(user) => collaborators.push(user.summary()),
                None => warn!(
                    document_id = %model.id,
                    user_id = %collaborator_id,
                    "Collaborator has no user record, skipping"
                ),
            }
        }

        Ok(DocumentResponse::from_model(model, owner, collaborators))
    }
}

fn validate_fields(title: &str, content: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation(
            "Document title must not be empty".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(AppError::Validation(
            "Document content must not be empty".to_string(),
        ));
    }
    Ok(())
}
