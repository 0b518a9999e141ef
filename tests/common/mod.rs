#![allow(dead_code)]

pub mod upstream;

use std::net::{IpAddr, Ipv4Addr};

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use tower::ServiceExt;

use fantasy_baseball_api::{app, config::Config, db, AppState};

// Nothing listens here, so every upstream call fails fast.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        espn_credentials: None,
        espn_base_url: UNREACHABLE.to_string(),
        fangraphs_base_url: UNREACHABLE.to_string(),
        savant_base_url: UNREACHABLE.to_string(),
    }
}

/// In-memory store with the schema applied. One connection keeps the data alive.
pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::init_schema(&pool).await.unwrap();
    pool
}

pub async fn test_app() -> (Router, SqlitePool) {
    let pool = test_pool().await;
    let router = app(AppState::new(pool.clone(), test_config()));
    (router, pool)
}

/// App whose ESPN, FanGraphs and Savant base URLs point at the canned upstream.
pub async fn test_app_with_upstream() -> (Router, SqlitePool) {
    let base = upstream::spawn().await;
    let config = Config {
        espn_base_url: format!("{}/flb", base),
        fangraphs_base_url: base.clone(),
        savant_base_url: base,
        ..test_config()
    };

    let pool = test_pool().await;
    let router = app(AppState::new(pool.clone(), config));
    (router, pool)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn response_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
