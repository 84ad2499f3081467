//! HTTP request handlers

use axum::{extract::Query, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{Result, ServerError};

/// Static greeting
pub async fn read_root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

#[derive(Debug, Deserialize)]
pub struct WelcomeQuery {
    pub name: Option<String>,
}

/// Echo the `name` query parameter
pub async fn welcome(Query(query): Query<WelcomeQuery>) -> Result<Json<Value>> {
    let name = query
        .name
        .ok_or_else(|| ServerError::BadRequest("missing query parameter 'name'".to_string()))?;
    Ok(Json(json!({ "name": name })))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn handle_404() -> ServerError {
    ServerError::NotFound("no such route, try / or /Welcome?name=...".to_string())
}
