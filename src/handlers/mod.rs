//! HTTP handlers for the `/api` resources.
//!
//! Every handler here takes an `AuthenticatedUser`, so a request without a
//! valid bearer token is rejected with 401 before any handler body runs.

pub mod analytics;
pub mod learner_vocabulary;
pub mod lessons;
pub mod vocabulary;

use actix_web::web;

use crate::auth::handlers as auth;

/// Mounts every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/register", web::post().to(auth::register))
            .route("/auth/logout", web::post().to(auth::logout))
            .route("/auth/profile", web::get().to(auth::profile))
            .route("/lessons", web::get().to(lessons::list_lessons))
            .route("/lessons", web::post().to(lessons::create_lesson))
            .route("/lessons/{id}", web::get().to(lessons::get_lesson))
            .route("/lessons/{id}", web::patch().to(lessons::update_lesson))
            .route("/lessons/{id}", web::delete().to(lessons::delete_lesson))
            .route("/lessons/{lesson_id}/tasks", web::post().to(lessons::create_task))
            .route("/lessons/{lesson_id}/tasks/{task_id}", web::delete().to(lessons::delete_task))
            .route("/vocabulary", web::get().to(vocabulary::list_entries))
            .route("/vocabulary", web::post().to(vocabulary::create_entry))
            .route("/vocabulary/{id}", web::get().to(vocabulary::get_entry))
            .route("/vocabulary/{id}", web::patch().to(vocabulary::update_entry))
            .route("/vocabulary/{id}", web::delete().to(vocabulary::delete_entry))
            .route("/vocabulary/{id}/translations", web::post().to(vocabulary::add_translation))
            .route(
                "/vocabulary/{entry_id}/translations/{translation_id}",
                web::patch().to(vocabulary::update_translation),
            )
            .route(
                "/vocabulary/{entry_id}/translations/{translation_id}",
                web::delete().to(vocabulary::delete_translation),
            )
            .route("/me/vocabulary", web::get().to(learner_vocabulary::list_words))
            .route("/me/vocabulary/{entry_id}", web::post().to(learner_vocabulary::track_word))
            .route("/me/vocabulary/{entry_id}", web::patch().to(learner_vocabulary::update_word_status))
            .route("/me/vocabulary/{entry_id}", web::delete().to(learner_vocabulary::untrack_word))
            .route("/analytics/overview", web::get().to(analytics::overview)),
    );
}
