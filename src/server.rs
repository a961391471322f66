//! HTTP surface.
//!
//! A single route, `POST /api/analyze`, backed by a shared [`Pipeline`].
//! Errors are rendered as `{"error": "..."}`: 400 when the request itself is
//! at fault (missing URL, unreadable body), 500 for everything else.

use std::{io, sync::Arc};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::ClipsightError,
    pipeline::{AnalysisRequest, AnalysisResponse, Pipeline},
};

/// Path of the analysis endpoint.
pub const ANALYZE_PATH: &str = "/api/analyze";

/// Error envelope returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub error: String,
}

/// Wrapper that renders a [`ClipsightError`] as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ClipsightError);

impl From<ClipsightError> for ApiError {
    fn from(error: ClipsightError) -> Self {
        ApiError(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ClipsightError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router for the analysis service.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(analyze_video))
        .with_state(pipeline)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the analysis service on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, pipeline: Arc<Pipeline>) -> io::Result<()> {
    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {error}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

async fn analyze_video(
    State(pipeline): State<Arc<Pipeline>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(request) = payload?;
    let response = pipeline.analyze(&request).await?;
    Ok(Json(response))
}
