pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthService, AuthenticatedUser, UserStore};
pub use db::{DbOperations, User};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Malformed or mistyped JSON bodies become 400s in the standard error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Path segments that fail to parse (e.g. a malformed UUID) name no resource: JSON 404.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Resource not found".to_string()).into())
}

/// Health check, JSON and path settings, and every `/api` route.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/health", web::get().to(health_check));
    handlers::configure(cfg);
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: Arc<DbOperations>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = Arc::new(DbOperations::connect(&config.database).await?);
        let users: Arc<dyn UserStore> = db.clone();
        Ok(Self::with_store(config, db, users))
    }

    /// Wires the state around an explicit user store, e.g. an in-memory one in tests.
    pub fn with_store(config: Settings, db: Arc<DbOperations>, users: Arc<dyn UserStore>) -> Self {
        let auth_service = AuthService::new(users, &config.auth.jwt_secret, config.token_ttl());

        Self {
            config: Arc::new(config),
            db,
            auth_service: Arc::new(auth_service),
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.close().await;
        Ok(())
    }
}
