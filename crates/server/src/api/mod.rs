//! JSON API surface.
//!
//! Every `/api` route requires a valid `wegroup_session` cookie and is
//! scoped to the session's tenant. Responses use the platform envelope:
//! `{ "success": true, "data": ... }` on success and
//! `{ "success": false, "error": "..." }` with a conventional status code
//! otherwise (400 validation, 401 unauthenticated, 404 not found, 409
//! stale workflow version, 500 internal, 502 AI collaborator failure).

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use wegroup_agent::{ChatCompletionClient, GuardrailPolicy};
use wegroup_core::scoring::WeightProfile;
use wegroup_db::DbPool;

pub mod invoices;
pub mod notifications;
pub mod suppliers;
pub mod transport;
pub mod workflows;

#[cfg(test)]
mod api_tests;

#[derive(Clone)]
pub struct ApiState {
    pub db_pool: DbPool,
    pub chat: Arc<dyn ChatCompletionClient>,
    pub guardrails: GuardrailPolicy,
    pub weight_profile: WeightProfile,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/invoices", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/api/invoices/{id}", get(invoices::get_invoice))
        .route("/api/invoices/{id}/route", post(invoices::route_invoice))
        .route("/api/workflows/{id}", get(workflows::get_workflow))
        .route("/api/workflows/{id}/decision", post(workflows::decide_stage))
        .route("/api/suppliers", get(suppliers::list_suppliers).post(suppliers::create_supplier))
        .route("/api/suppliers/{id}", get(suppliers::get_supplier))
        .route(
            "/api/transport/requests",
            get(transport::list_requests).post(transport::create_request),
        )
        .route("/api/transport/requests/{id}", get(transport::get_request))
        .route("/api/transport/requests/{id}/quotes", post(transport::add_quote))
        .route("/api/transport/requests/{id}/comparison", get(transport::compare_quotes))
        .route("/api/transport/requests/{id}/award", post(transport::award_request))
        .route("/api/notifications", get(notifications::list_notifications))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiEnvelope<T>> {
    Json(ApiEnvelope { success: true, data: Some(data), error: None })
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: "authentication required".to_string() }
    }

    pub fn not_found(resource: &str) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: format!("{resource} not found") }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self { status: StatusCode::CONFLICT, message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, message: message.into() }
    }

    pub fn upstream(error: impl std::fmt::Display) -> Self {
        error!(
            event_name = "api.ai_collaborator_failed",
            error = %error,
            "ai collaborator call failed"
        );
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: "ai collaborator request failed".to_string(),
        }
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        error!(event_name = "api.internal_error", error = %error, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope: ApiEnvelope<()> =
            ApiEnvelope { success: false, data: None, error: Some(self.message) };
        (self.status, Json(envelope)).into_response()
    }
}
