//! HTTP adapter over [`RainfallService`].

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ErrorKind, PredictError};
use crate::pipeline::RainfallService;
use crate::types::{ErrorOut, HealthOut, PredictionOut, RawInput};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RainfallService>,
}

type ApiError = (StatusCode, Json<ErrorOut>);

fn error_response(status: StatusCode, msg: String) -> ApiError {
    (
        status,
        Json(ErrorOut {
            success: false,
            error: msg,
        }),
    )
}

fn map_error(e: PredictError) -> ApiError {
    let status = match (&e, e.kind()) {
        (PredictError::ServiceUnavailable(_), _) => StatusCode::SERVICE_UNAVAILABLE,
        (_, ErrorKind::Client) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::Server) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::BAD_REQUEST {
        tracing::warn!(error = %e, "rejected prediction request");
    } else {
        tracing::error!(error = %e, "prediction failed");
    }
    error_response(status, e.to_string())
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawInput>, JsonRejection>,
) -> Result<Json<PredictionOut>, ApiError> {
    let Json(raw) = payload.map_err(|e| {
        tracing::warn!(error = %e, "bad request body");
        error_response(StatusCode::BAD_REQUEST, e.body_text())
    })?;

    // The forward pass is CPU-bound; keep it off the async workers.
    let service = state.service.clone();
    let prediction = tokio::task::spawn_blocking(move || service.predict(&raw))
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(map_error)?;

    Ok(Json(PredictionOut {
        success: true,
        prediction,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok",
        model_loaded: state.service.is_ready(),
    })
}

pub fn router(service: Arc<RainfallService>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(AppState { service })
}
