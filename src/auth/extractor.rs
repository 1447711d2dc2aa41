use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::ops::Deref;

use crate::db::models::User;
use crate::error::AppError;
use crate::AppState;

/// The caller of a protected route, loaded fresh from the store on every request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl Deref for AuthenticatedUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("Application state is not configured".into()))?;
            let user = state.auth_service.authenticate_request(header.as_deref()).await?;
            Ok(AuthenticatedUser(user))
        })
    }
}
