// Public API - what other modules can use
pub use handlers::{
    add_collaborator, create_document, get_document, invite_collaborator, list_documents,
    remove_collaborator, update_document,
};
pub use service::{AccessLevel, DocumentService};
pub use types::{
    CollaboratorRequest, DocumentCreateRequest, DocumentResponse, DocumentUpdateRequest,
    InviteResponse,
};

// Internal modules
mod handlers;
pub mod invitations;
pub mod models;
pub mod repository;
pub mod service;
mod types;
