//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, PlanRequest, PlanResponse, ThemeSummary},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_plan,
        handlers::health,
        handlers::list_themes,
    ),
    components(
        schemas(PlanRequest, PlanResponse, ThemeSummary, HealthResponse, ErrorResponse)
    ),
    tags(
        (name = "Learning Plan API", description = "Personalized four-week learning plans")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/plans", post(handlers::create_plan))
        .route("/health", get(handlers::health))
        .route("/themes", get(handlers::list_themes))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/plans", "/health", "/themes"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
