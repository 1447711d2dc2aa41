use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, error};
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::AppState;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    req.validate()?;
    info!("Received login request for email: {}", req.email);
    let response = state.auth_service.login(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    req.validate()?;
    info!("Received registration request for email: {}", req.email);

    match state.auth_service.register(&req.email, &req.password, &req.name).await {
        Ok(response) => Ok(HttpResponse::Created().json(response)),
        Err(e) => {
            error!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// Tokens are stateless; logging out only tells the client to drop its token.
pub async fn logout(user: AuthenticatedUser) -> Result<HttpResponse> {
    info!("User {} logged out", user.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

pub async fn profile(user: AuthenticatedUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "user": user.profile() })))
}
