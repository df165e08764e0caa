use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coedit::auth;
use coedit::auth::repository::InMemoryUserRepository;
use coedit::document;
use coedit::document::invitations::InMemoryInvitationRepository;
use coedit::document::repository::InMemoryDocumentRepository;
// use coedit::auth::repository::PostgresUserRepository; // For production
// use coedit::document::invitations::PostgresInvitationRepository; // For production
// use coedit::document::repository::PostgresDocumentRepository; // For production
use coedit::relay::RelayService;
use coedit::shared::{AppError, AppState};
use coedit::websockets::{websocket_handler, ConnectionManager};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coedit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting coedit collaborative document server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let document_repository = Arc::new(InMemoryDocumentRepository::new());
    let invitation_repository = Arc::new(InMemoryInvitationRepository::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    // let document_repository = Arc::new(PostgresDocumentRepository::new(pool.clone()));
    // let invitation_repository = Arc::new(PostgresInvitationRepository::new(pool));

    let connection_manager = Arc::new(ConnectionManager::new());
    let relay = RelayService::spawn(connection_manager.clone());

    let app_state = AppState::new(
        user_repository,
        document_repository,
        invitation_repository,
        connection_manager,
        relay,
    );

    // Document routes require a valid token
    let protected_routes = Router::new()
        .route(
            "/documents",
            get(document::list_documents).post(document::create_document),
        )
        .route(
            "/documents/:id",
            get(document::get_document).put(document::update_document),
        )
        .route(
            "/documents/:id/collaborators",
            put(document::add_collaborator).delete(document::remove_collaborator),
        )
        .route(
            "/documents/:id/invitations",
            post(document::invite_collaborator),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::jwt_auth,
        ));

    // build our application
    let app = Router::new()
        .route("/", get(|| async { "coedit server" }))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/ws", get(websocket_handler))
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(1337);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("Server running on http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
