use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::db::StatusChange;
use crate::error::AppError;
use crate::AppState;
use crate::Result;

pub async fn list_words(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let vocabulary = state.db.list_learner_words(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "vocabulary": vocabulary })))
}

pub async fn track_word(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let word = state
        .db
        .track_word(user.id, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Vocabulary entry"))?;
    Ok(HttpResponse::Created().json(json!({ "vocabulary": word })))
}

pub async fn update_word_status(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<StatusChange>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let word = state
        .db
        .set_word_status(user.id, path.into_inner(), body.status)
        .await?
        .ok_or_else(|| AppError::not_found("Learner vocabulary entry"))?;
    Ok(HttpResponse::Ok().json(json!({ "vocabulary": word })))
}

pub async fn untrack_word(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !state.db.untrack_word(user.id, path.into_inner()).await? {
        return Err(AppError::not_found("Learner vocabulary entry"));
    }
    Ok(HttpResponse::NoContent().finish())
}
