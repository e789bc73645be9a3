//! HTTP entry point for the onboarding function.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::model::OnboardRequest;
use super::pipeline::Onboarder;
use crate::error::OnboardingError;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardRouteState {
    pub onboarder: Arc<Onboarder>,
}

impl IntoResponse for OnboardingError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InvalidBody(_) | Self::Platform { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match &self {
            Self::Platform { stage, source } => tracing::error!(
                stage = %stage,
                error = %source,
                "Onboarding failed"
            ),
            Self::InvalidBody(reason) => {
                tracing::error!(error = %reason, "Failed to parse onboarding request")
            }
            Self::Internal(message) => tracing::error!(error = %message, "Onboarding failed"),
            _ => tracing::debug!(status = status.as_u16(), error = %self, "Onboarding rejected"),
        }

        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// POST /
///
/// Onboards one staff member. The body is parsed here rather than by the
/// `Json` extractor so empty and malformed bodies get the service's own
/// `{ "error": ... }` shape.
async fn onboard(State(state): State<OnboardRouteState>, body: Bytes) -> Response {
    let request = match OnboardRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match state.onboarder.onboard(request).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "staff-onboard"
    }))
}

/// Build the onboarding routes.
pub fn onboard_routes(onboarder: Arc<Onboarder>) -> Router {
    Router::new()
        .route("/", post(onboard))
        .route("/health", get(health))
        .with_state(OnboardRouteState { onboarder })
}
