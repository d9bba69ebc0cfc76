use axum::{extract::Extension, Json};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use super::ApiJson;
use crate::error::AppError;
use crate::services::farmers;

#[derive(serde::Deserialize)]
pub struct TokenRequest {
    /// Username or email.
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn obtain_token(
    Extension(db): Extension<DatabaseConnection>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<Value>, AppError> {
    let farmer = farmers::authenticate(&db, &payload.username, &payload.password).await?;
    let token = farmers::issue_token(&db, farmer.id).await?;
    Ok(Json(json!({"token": token})))
}
