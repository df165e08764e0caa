use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{DocumentKind, DocumentModel};
use crate::shared::AppError;

/// Field changes applied by a document update.
#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    pub title: String,
    pub content: String,
    pub comments: Option<String>,
}

/// Outcome of updating a document's fields.
#[derive(Debug)]
pub enum UpdateDocumentResult {
    Updated(DocumentModel),
    NotFound,
}

/// Outcome of a collaborator list change.
#[derive(Debug)]
pub enum CollaboratorUpdateResult {
    Updated(DocumentModel),
    DocumentNotFound,
}

/// Trait for document repository operations
#[async_trait]
pub trait DocumentRepository {
    async fn create_document(&self, document: &DocumentModel) -> Result<(), AppError>;
    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentModel>, AppError>;
    /// Every document the user owns or collaborates on.
    async fn list_documents_for_user(&self, user_id: &str) -> Result<Vec<DocumentModel>, AppError>;
    async fn update_document(
        &self,
        document_id: &str,
        update: DocumentUpdate,
    ) -> Result<UpdateDocumentResult, AppError>;
    /// Set-style add; adding an existing collaborator changes nothing.
    async fn add_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError>;
    /// Set-style remove; removing a non-collaborator changes nothing.
    async fn remove_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError>;
}

/// In-memory implementation of DocumentRepository for development and testing
pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<String, DocumentModel>>,
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated documents
    pub fn with_documents(documents: Vec<DocumentModel>) -> Self {
        let mut document_map = HashMap::new();
        for document in documents {
            document_map.insert(document.id.clone(), document);
        }

        Self {
            documents: Mutex::new(document_map),
        }
    }

    /// Returns the current number of documents in the repository
    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn create_document(&self, document: &DocumentModel) -> Result<(), AppError> {
        debug!(document_id = %document.id, title = %document.title, "Creating document in memory");

        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(&document.id) {
            warn!(document_id = %document.id, "Document already exists in memory");
            return Err(AppError::DatabaseError(
                "Document already exists".to_string(),
            ));
        }
        documents.insert(document.id.clone(), document.clone());

        debug!(document_id = %document.id, "Document created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentModel>, AppError> {
        debug!(document_id = %document_id, "Fetching document from memory");

        let documents = self.documents.lock().unwrap();
        Ok(documents.get(document_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_documents_for_user(&self, user_id: &str) -> Result<Vec<DocumentModel>, AppError> {
        debug!(user_id = %user_id, "Listing documents for user from memory");

        let documents = self.documents.lock().unwrap();
        let mut accessible: Vec<DocumentModel> = documents
            .values()
            .filter(|document| document.has_access(user_id))
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; keep listings stable.
        accessible.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        debug!(
            user_id = %user_id,
            document_count = accessible.len(),
            "Found documents for user in memory"
        );
        Ok(accessible)
    }

    #[instrument(skip(self, update))]
    async fn update_document(
        &self,
        document_id: &str,
        update: DocumentUpdate,
    ) -> Result<UpdateDocumentResult, AppError> {
        debug!(document_id = %document_id, "Updating document in memory");

        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(document_id) {
            Some(document) => {
                document.title = update.title;
                document.content = update.content;
                document.comments = update.comments;
                document.updated_at = Utc::now();
                Ok(UpdateDocumentResult::Updated(document.clone()))
            }
            None => {
                debug!(document_id = %document_id, "Document not found for update in memory");
                Ok(UpdateDocumentResult::NotFound)
            }
        }
    }

    #[instrument(skip(self))]
    async fn add_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError> {
        debug!(document_id = %document_id, user_id = %user_id, "Adding collaborator in memory");

        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(document_id) {
            Some(document) => {
                let added = document.add_collaborator(user_id);
                debug!(
                    document_id = %document_id,
                    user_id = %user_id,
                    newly_added = added,
                    "Collaborator add applied in memory"
                );
                Ok(CollaboratorUpdateResult::Updated(document.clone()))
            }
            None => Ok(CollaboratorUpdateResult::DocumentNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn remove_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError> {
        debug!(document_id = %document_id, user_id = %user_id, "Removing collaborator in memory");

        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(document_id) {
            Some(document) => {
                let removed = document.remove_collaborator(user_id);
                debug!(
                    document_id = %document_id,
                    user_id = %user_id,
                    was_present = removed,
                    "Collaborator remove applied in memory"
                );
                Ok(CollaboratorUpdateResult::Updated(document.clone()))
            }
            None => Ok(CollaboratorUpdateResult::DocumentNotFound),
        }
    }
}

/// PostgreSQL implementation of document repository
///
/// Collaborator ids live in a TEXT[] column; the array operators keep
/// add and remove idempotent on the database side.
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn document_from_row(row: &sqlx::postgres::PgRow) -> Result<DocumentModel, AppError> {
        let kind: String = row.get("kind");
        let kind = kind.parse::<DocumentKind>().map_err(|_| {
            AppError::DatabaseError(format!("Invalid document kind: {}", kind))
        })?;

        Ok(DocumentModel {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            kind,
            comments: row.get("comments"),
            owner_id: row.get("owner_id"),
            collaborator_ids: row.get("collaborator_ids"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn fetch_document(
        &self,
        document_id: &str,
    ) -> Result<Option<DocumentModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, content, kind, comments, owner_id, collaborator_ids, created_at, updated_at \
             FROM documents WHERE id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, document_id = %document_id, "Failed to fetch document from database");
            AppError::DatabaseError(e.to_string())
        })?;

        row.map(|row| Self::document_from_row(&row)).transpose()
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    #[instrument(skip(self, document))]
    async fn create_document(&self, document: &DocumentModel) -> Result<(), AppError> {
        debug!(document_id = %document.id, "Creating document in database");

        sqlx::query(
            "INSERT INTO documents (id, title, content, kind, comments, owner_id, collaborator_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&document.id)
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.kind.to_string())
        .bind(&document.comments)
        .bind(&document.owner_id)
        .bind(&document.collaborator_ids)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create document in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(document_id = %document.id, "Document created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_document(&self, document_id: &str) -> Result<Option<DocumentModel>, AppError> {
        debug!(document_id = %document_id, "Fetching document from database");
        self.fetch_document(document_id).await
    }

    #[instrument(skip(self))]
    async fn list_documents_for_user(&self, user_id: &str) -> Result<Vec<DocumentModel>, AppError> {
        debug!(user_id = %user_id, "Listing documents for user from database");

        let rows = sqlx::query(
            "SELECT id, title, content, kind, comments, owner_id, collaborator_ids, created_at, updated_at \
             FROM documents WHERE owner_id = $1 OR $1 = ANY(collaborator_ids) \
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to list documents from database");
            AppError::DatabaseError(e.to_string())
        })?;

        rows.iter().map(Self::document_from_row).collect()
    }

    #[instrument(skip(self, update))]
    async fn update_document(
        &self,
        document_id: &str,
        update: DocumentUpdate,
    ) -> Result<UpdateDocumentResult, AppError> {
        debug!(document_id = %document_id, "Updating document in database");

        let result = sqlx::query(
            "UPDATE documents SET title = $2, content = $3, comments = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(document_id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(&update.comments)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, document_id = %document_id, "Failed to update document in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Ok(UpdateDocumentResult::NotFound);
        }

        match self.fetch_document(document_id).await? {
            Some(document) => Ok(UpdateDocumentResult::Updated(document)),
            None => Ok(UpdateDocumentResult::NotFound),
        }
    }

    #[instrument(skip(self))]
    async fn add_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError> {
        debug!(document_id = %document_id, user_id = %user_id, "Adding collaborator in database");

        sqlx::query(
            "UPDATE documents SET collaborator_ids = array_append(collaborator_ids, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(collaborator_ids))",
        )
        .bind(document_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, document_id = %document_id, "Failed to add collaborator in database");
            AppError::DatabaseError(e.to_string())
        })?;

        match self.fetch_document(document_id).await? {
            Some(document) => Ok(CollaboratorUpdateResult::Updated(document)),
            None => Ok(CollaboratorUpdateResult::DocumentNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn remove_collaborator(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<CollaboratorUpdateResult, AppError> {
        debug!(document_id = %document_id, user_id = %user_id, "Removing collaborator in database");

        sqlx::query(
            "UPDATE documents SET collaborator_ids = array_remove(collaborator_ids, $2) WHERE id = $1",
        )
        .bind(document_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, document_id = %document_id, "Failed to remove collaborator in database");
            AppError::DatabaseError(e.to_string())
        })?;

        match self.fetch_document(document_id).await? {
            Some(document) => Ok(CollaboratorUpdateResult::Updated(document)),
            None => Ok(CollaboratorUpdateResult::DocumentNotFound),
        }
    }
}
