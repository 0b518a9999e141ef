use axum::{extract::State, response::Json};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use crate::db;
use crate::error::ApiError;

pub const SERVICE_NAME: &str = "Fantasy Baseball API";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub version: &'static str,
    pub health: &'static str,
}

// GET /
pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        health: "/health",
    })
}

// GET /health
pub async fn health_check(State(pool): State<SqlitePool>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = db::ping(&pool).await {
        tracing::error!("Health check failed: {}", err);
        return Err(ApiError::Unavailable);
    }

    Ok(Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        database: "connected",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
