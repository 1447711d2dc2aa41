mod common;

use actix_web::{test, web, App};
use common::{test_state, user_with_password, MemoryUserStore};
use lingua_server::auth::TokenAuthenticator;
use lingua_server::configure_app;
use lingua_server::db::Role;
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! app {
    ($users:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(test_state($users.clone())))
                .configure(configure_app),
        )
        .await
    };
}

async fn seeded_store() -> Arc<MemoryUserStore> {
    let users = Arc::new(MemoryUserStore::default());
    users
        .insert(user_with_password("admin@example.com", "admin123", Role::Admin))
        .await;
    users
}

#[actix_web::test]
async fn test_login_returns_token_and_profile() {
    let users = seeded_store().await;
    let app = app!(users);

    let response = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@example.com", "password": "admin123" }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = test::read_body_json(response).await;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("salt").is_none());

    let tokens = TokenAuthenticator::new("test_secret", chrono::Duration::hours(1));
    let claims = tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, body["user"]["id"].as_str().unwrap());
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[actix_web::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let users = seeded_store().await;
    let app = app!(users);

    let wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@example.com", "password": "not-the-password" }))
        .send_request(&app)
        .await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_password: Value = test::read_body_json(wrong_password).await;

    let unknown = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "admin123" }))
        .send_request(&app)
        .await;
    assert_eq!(unknown.status(), 401);
    let unknown: Value = test::read_body_json(unknown).await;

    assert_eq!(wrong_password, unknown);
    assert_eq!(unknown["message"], "Invalid credentials");
}

#[actix_web::test]
async fn test_login_payload_is_validated() {
    let users = seeded_store().await;
    let app = app!(users);

    let short_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@example.com", "password": "123" }))
        .send_request(&app)
        .await;
    assert_eq!(short_password.status(), 400);

    let malformed_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@example..com", "password": "admin123" }))
        .send_request(&app)
        .await;
    assert_eq!(malformed_email.status(), 400);
    let body: Value = test::read_body_json(malformed_email).await;
    assert!(body["message"].as_str().unwrap().contains("email must be a valid email address"));

    let missing_field = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "admin@example.com" }))
        .send_request(&app)
        .await;
    assert_eq!(missing_field.status(), 400);
    let body: Value = test::read_body_json(missing_field).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid payload"));
}

#[actix_web::test]
async fn test_profile_reflects_the_live_record() {
    let users = seeded_store().await;
    let app = app!(users);

    let login: Value = test::read_body_json(
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "admin@example.com", "password": "admin123" }))
            .send_request(&app)
            .await,
    )
    .await;
    let token = login["token"].as_str().unwrap().to_string();
    let user_id = login["user"]["id"].as_str().unwrap().parse().unwrap();

    users.rename(user_id, "Head Admin").await;

    let response = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["user"]["name"], "Head Admin");
}

#[actix_web::test]
async fn test_deleted_user_token_is_rejected() {
    let users = seeded_store().await;
    let app = app!(users);

    let login: Value = test::read_body_json(
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "admin@example.com", "password": "admin123" }))
            .send_request(&app)
            .await,
    )
    .await;
    let token = login["token"].as_str().unwrap().to_string();
    users.remove(login["user"]["id"].as_str().unwrap().parse().unwrap()).await;

    let response = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "User not found");
}

#[actix_web::test]
async fn test_bad_tokens_share_one_message() {
    let users = seeded_store().await;
    let app = app!(users);

    let forged = TokenAuthenticator::new("another_secret", chrono::Duration::hours(1))
        .issue(uuid::Uuid::new_v4(), Role::Admin)
        .unwrap();
    let expired = TokenAuthenticator::new("test_secret", chrono::Duration::hours(1))
        .issue_with_ttl(uuid::Uuid::new_v4(), Role::Admin, chrono::Duration::seconds(-30))
        .unwrap();

    for token in [forged, expired, "garbage".to_string()] {
        let response = test::TestRequest::get()
            .uri("/api/auth/profile")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .send_request(&app)
            .await;
        assert_eq!(response.status(), 401);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Invalid or expired token");
    }
}

#[actix_web::test]
async fn test_missing_header() {
    let users = seeded_store().await;
    let app = app!(users);

    let response = test::TestRequest::get().uri("/api/auth/profile").send_request(&app).await;
    assert_eq!(response.status(), 401);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Missing authorization header");
}

#[actix_web::test]
async fn test_register_then_login() {
    let users = Arc::new(MemoryUserStore::default());
    let app = app!(users);

    let register = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "new@example.com", "password": "password123", "name": "New Learner" }))
        .send_request(&app)
        .await;
    assert_eq!(register.status(), 201);
    let body: Value = test::read_body_json(register).await;
    assert_eq!(body["user"]["role"], "learner");

    let duplicate = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": "new@example.com", "password": "password456", "name": "Again" }))
        .send_request(&app)
        .await;
    assert_eq!(duplicate.status(), 409);

    let login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "new@example.com", "password": "password123" }))
        .send_request(&app)
        .await;
    assert_eq!(login.status(), 200);
}

#[actix_web::test]
async fn test_logout_is_stateless() {
    let users = seeded_store().await;
    let app = app!(users);

    let login: Value = test::read_body_json(
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "admin@example.com", "password": "admin123" }))
            .send_request(&app)
            .await,
    )
    .await;
    let header = format!("Bearer {}", login["token"].as_str().unwrap());

    let logout = test::TestRequest::post()
        .uri("/api/auth/logout")
        .insert_header(("Authorization", header.clone()))
        .send_request(&app)
        .await;
    assert_eq!(logout.status(), 200);
    let body: Value = test::read_body_json(logout).await;
    assert_eq!(body["message"], "Logged out");

    // No revocation list: the token stays usable until it expires.
    let profile = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(("Authorization", header))
        .send_request(&app)
        .await;
    assert_eq!(profile.status(), 200);
}
