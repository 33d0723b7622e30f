//! HTTP surface: `POST /analyze`, permissive CORS and optional static files.

use crate::analyzer::PageStyleExtractor;
use crate::style::AnalysisResult;
use crate::{Error, Launch};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use log::error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Shared state accessible from Axum handlers.
pub struct AppState<L> {
    extractor: PageStyleExtractor<L>,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
        }
    }
}

/// Build the router. When `static_dir` is set, unmatched paths are served
/// from it.
pub fn router<L: Launch>(extractor: PageStyleExtractor<L>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/analyze", post(analyze_handler::<L>))
        .with_state(AppState { extractor });

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
}

/// POST /analyze
async fn analyze_handler<L: Launch>(
    State(state): State<AppState<L>>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> std::result::Result<Json<AnalysisResult>, Error> {
    let Json(request) =
        payload.map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;
    let url = request
        .url
        .ok_or_else(|| Error::InvalidInput("missing `url` field".into()))?;

    let result = state.extractor.analyze(&url).await?;
    Ok(Json(result))
}

/// HTTP status for each failure kind.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::InitializationError(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::LoadError(_) => StatusCode::BAD_GATEWAY,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
