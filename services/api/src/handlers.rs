//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for plan
//! generation. It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use kidplan_core::profile::ProfileError;
use kidplan_core::theme::THEME_WEEKS;
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    models::{ErrorResponse, HealthResponse, PlanRequest, PlanResponse, ThemeSummary},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!(%message, "Rejected plan request");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Build a four-week learning plan for a child profile.
#[utoipa::path(
    post,
    path = "/plans",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Plan generated", body = PlanResponse),
        (status = 400, description = "Profile input was not a JSON object", body = ErrorResponse)
    )
)]
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("plan_request", %request_id);

    let output = state
        .planner
        .plan_from_input(&payload)
        .instrument(span)
        .await?;

    info!(%request_id, confidence = ?output.confidence, "Plan request served");
    Ok((StatusCode::OK, Json(PlanResponse::new(request_id, output))))
}

/// Report service health and catalog size.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        catalog_topics: state.planner.catalog().len(),
        provider: format!("{:?}", state.config.provider),
    })
}

/// List the four theme weeks every plan follows.
#[utoipa::path(
    get,
    path = "/themes",
    responses(
        (status = 200, description = "Theme weeks in plan order", body = [ThemeSummary])
    )
)]
pub async fn list_themes() -> Json<Vec<ThemeSummary>> {
    Json(
        THEME_WEEKS
            .iter()
            .enumerate()
            .map(|(i, theme)| ThemeSummary::new(i + 1, theme))
            .collect(),
    )
}
