// Public API - what other modules can use
pub use handlers::{login, register};
pub use middleware::jwt_auth;
pub use service::AuthService;
pub use types::{AuthClaims, AuthResponse, LoginRequest, RegisterRequest, UserSummary};

// Internal modules
mod handlers;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
mod types;
