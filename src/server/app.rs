use anyhow::Context;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{extract::FromRef, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::error::AppError;
use super::routes::{category_router, dashboard_router, events_router, participants_router};
use crate::config::Settings;

#[derive(FromRef, Clone)]
pub struct AppState {
    pool: SqlitePool,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(pool: SqlitePool, static_dir: PathBuf) -> Self {
        Self { pool, static_dir }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .merge(events_router(state.clone()))
        .merge(participants_router(state.clone()))
        .merge(category_router(state.clone()))
        .merge(dashboard_router(state))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(pool: SqlitePool, settings: &Settings) -> anyhow::Result<()> {
    let addr = settings.address();
    let app = router(AppState::new(pool, settings.static_dir.clone()));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn fallback(uri: Uri) -> AppError {
    tracing::info!(%uri, "Fallback");
    AppError::NotFound("Page".to_owned())
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    if let Err(err) = encoder.encode(&metrics, &mut buf) {
        tracing::error!(error = ?err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_owned())],
        buf,
    )
        .into_response()
}
