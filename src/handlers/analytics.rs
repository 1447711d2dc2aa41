use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::AppState;
use crate::Result;

pub async fn overview(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let stats = state.db.analytics_overview().await?;
    Ok(HttpResponse::Ok().json(json!({ "stats": stats })))
}
