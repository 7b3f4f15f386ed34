//! JSON-over-HTTP adapter for the prediction pipeline.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::pipeline::PipelineContext;
use crate::reference::ReferenceCatalog;
use crate::types::{PredictionResult, RawInput};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<PipelineContext>,
    pub catalog: Arc<ReferenceCatalog>,
    pub log_pred: bool,
}

pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/options", get(options))
        .route("/health", get(health))
        .with_state(state)
}

fn error_response(err: PipelineError) -> ApiError {
    let status = if err.is_recoverable() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        // validation passed, so the deployment itself is inconsistent
        tracing::error!(kind = err.kind(), "pipeline failure: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}

fn rejection_response(rejection: JsonRejection) -> ApiError {
    (
        rejection.status(),
        Json(json!({ "error": rejection.body_text(), "kind": "bad_request" })),
    )
}

// ---------- Handlers ----------

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawInput>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(input) = payload.map_err(rejection_response)?;
    let features = state.ctx.encode(&input).map_err(error_response)?;

    if state.log_pred {
        let nz = features.values().iter().filter(|x| **x != 0.0).count();
        let sample: Vec<String> = state
            .ctx
            .schema()
            .ordered_columns()
            .iter()
            .zip(features.values())
            .take(3)
            .map(|(col, v)| format!("{}={:.3}", col.header(), v))
            .collect();
        tracing::info!(
            "recv country={} crop={} in_dim={} nonzero={} sample=[{}]",
            input.country,
            input.crop,
            features.len(),
            nz,
            sample.join(", ")
        );
    }

    let native = state.ctx.infer(features).map_err(error_response)?;
    Ok(Json(crate::format::format(native)))
}

pub async fn options(State(state): State<AppState>) -> Json<ReferenceCatalog> {
    Json(state.catalog.as_ref().clone())
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "features": state.ctx.schema().len(),
        "expanded": state.ctx.expanded_width(),
    }))
}
