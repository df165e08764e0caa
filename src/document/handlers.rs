use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::DocumentService,
    types::{
        CollaboratorRequest, DocumentCreateRequest, DocumentResponse, DocumentUpdateRequest,
        InviteResponse,
    },
};
use crate::auth::AuthClaims;
use crate::shared::{AppError, AppState};

fn document_service(state: &AppState) -> DocumentService {
    DocumentService::new(
        Arc::clone(&state.document_repository),
        Arc::clone(&state.user_repository),
        Arc::clone(&state.invitation_repository),
    )
}

/// HTTP handler for listing the caller's documents
///
/// GET /documents
#[instrument(name = "list_documents", skip(state, claims))]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let documents = document_service(&state)
        .list_documents(&claims.user_id)
        .await?;
    Ok(Json(documents))
}

/// HTTP handler for creating a document
///
/// POST /documents
#[instrument(name = "create_document", skip(state, claims, request))]
pub async fn create_document(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<DocumentCreateRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    info!(user_id = %claims.user_id, title = %request.title, "Creating document");

    let document = document_service(&state)
        .create_document(&claims.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

/// HTTP handler for fetching one document
///
/// GET /documents/:id
#[instrument(name = "get_document", skip(state, claims))]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = document_service(&state)
        .get_document(&claims.user_id, &document_id)
        .await?;
    Ok(Json(document))
}

/// HTTP handler for replacing a document's editable fields
///
/// PUT /documents/:id
#[instrument(name = "update_document", skip(state, claims, request))]
pub async fn update_document(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(document_id): Path<String>,
    Json(request): Json<DocumentUpdateRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = document_service(&state)
        .update_document(&claims.user_id, &document_id, request)
        .await?;
    Ok(Json(document))
}

/// HTTP handler for adding a collaborator by email
///
/// PUT /documents/:id/collaborators
#[instrument(name = "add_collaborator", skip(state, claims, request))]
pub async fn add_collaborator(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(document_id): Path<String>,
    Json(request): Json<CollaboratorRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = document_service(&state)
        .add_collaborator(&claims.user_id, &document_id, &request.email)
        .await?;
    Ok(Json(document))
}

/// HTTP handler for removing a collaborator by email
///
/// DELETE /documents/:id/collaborators
#[instrument(name = "remove_collaborator", skip(state, claims, request))]
pub async fn remove_collaborator(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(document_id): Path<String>,
    Json(request): Json<CollaboratorRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = document_service(&state)
        .remove_collaborator(&claims.user_id, &document_id, &request.email)
        .await?;
    Ok(Json(document))
}

/// HTTP handler for sharing a document with an email address
///
/// POST /documents/:id/invitations
#[instrument(name = "invite_collaborator", skip(state, claims, request))]
pub async fn invite_collaborator(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Path(document_id): Path<String>,
    Json(request): Json<CollaboratorRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    let response = document_service(&state)
        .invite_collaborator(&claims.user_id, &document_id, &request.email)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}
