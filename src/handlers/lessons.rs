use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::db::{LessonChanges, NewLesson, NewTask};
use crate::error::AppError;
use crate::AppState;
use crate::Result;

pub async fn list_lessons(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let lessons = state.db.list_lessons().await?;
    Ok(HttpResponse::Ok().json(json!({ "lessons": lessons })))
}

pub async fn get_lesson(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let lesson = state
        .db
        .get_lesson(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Lesson"))?;
    Ok(HttpResponse::Ok().json(json!({ "lesson": lesson })))
}

pub async fn create_lesson(
    user: AuthenticatedUser,
    body: web::Json<NewLesson>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let lesson = state.db.create_lesson(user.id, &body).await?;
    info!("User {} created lesson {}", user.id, lesson.id);
    Ok(HttpResponse::Created().json(json!({ "lesson": lesson })))
}

pub async fn update_lesson(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<LessonChanges>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let lesson_id = path.into_inner();
    let lesson = state
        .db
        .update_lesson(lesson_id, &body)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson"))?;
    info!("User {} updated lesson {}", user.id, lesson_id);
    Ok(HttpResponse::Ok().json(json!({ "lesson": lesson })))
}

pub async fn delete_lesson(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let lesson_id = path.into_inner();
    if !state.db.delete_lesson(lesson_id).await? {
        return Err(AppError::not_found("Lesson"));
    }
    info!("User {} deleted lesson {}", user.id, lesson_id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn create_task(
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<NewTask>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    body.validate()?;
    let task = state
        .db
        .create_task(path.into_inner(), &body)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson"))?;
    Ok(HttpResponse::Created().json(json!({ "task": task })))
}

pub async fn delete_task(
    _user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (lesson_id, task_id) = path.into_inner();
    if !state.db.delete_task(lesson_id, task_id).await? {
        return Err(AppError::not_found("Task"));
    }
    Ok(HttpResponse::NoContent().finish())
}
