use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::db::{EntryChanges, NewEntry, NewTranslation, TranslationChanges};
use crate::error::AppError;
use crate::AppState;
use crate::Result;

pub async fn list_entries(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let entries = state.db.list_entries().await?;
    Ok(HttpResponse::Ok().json(json!({ "entries": entries })))
}

pub async fn get_entry(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let entry = state
        .db
        .get_entry(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Vocabulary entry"))?;
    Ok(HttpResponse::Ok().json(json!({ "entry": entry })))
}

pub async fn create_entry(
    user: AuthenticatedUser,
    body: web::Json<NewEntry>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let entry = state.db.create_entry(Some(user.id), &body).await?;
    Ok(HttpResponse::Created().json(json!({ "entry": entry })))
}

pub async fn update_entry(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<EntryChanges>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let entry = state
        .db
        .update_entry(path.into_inner(), &body)
        .await?
        .ok_or_else(|| AppError::not_found("Vocabulary entry"))?;
    Ok(HttpResponse::Ok().json(json!({ "entry": entry })))
}

pub async fn delete_entry(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !state.db.delete_entry(path.into_inner()).await? {
        return Err(AppError::not_found("Vocabulary entry"));
    }
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_translation(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<NewTranslation>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let translation = state
        .db
        .add_translation(path.into_inner(), &body)
        .await?
        .ok_or_else(|| AppError::not_found("Vocabulary entry"))?;
    Ok(HttpResponse::Created().json(json!({ "translation": translation })))
}

pub async fn update_translation(
    _user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<TranslationChanges>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let (entry_id, translation_id) = path.into_inner();
    let translation = state
        .db
        .update_translation(entry_id, translation_id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Translation"))?;
    Ok(HttpResponse::Ok().json(json!({ "translation": translation })))
}

pub async fn delete_translation(
    _user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (entry_id, translation_id) = path.into_inner();
    if !state.db.delete_translation(entry_id, translation_id).await? {
        return Err(AppError::not_found("Translation"));
    }
    Ok(HttpResponse::NoContent().finish())
}
