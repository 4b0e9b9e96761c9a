use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use salesdesk_core::ServiceKind;
use serde::Serialize;

/// What the health endpoints report about the running process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceStatus {
    pub service: ServiceKind,
    /// `None` when the hosted service does not read the CRM.
    pub crm_backend: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub crm: HealthCheck,
    pub checked_at: String,
}

pub fn router(status: ServiceStatus) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status_line))
        .with_state(status)
}

pub async fn health(State(status): State<ServiceStatus>) -> (StatusCode, Json<HealthResponse>) {
    let crm = match status.crm_backend {
        Some(backend) => HealthCheck {
            status: "ready",
            detail: format!("{backend} backend configured"),
        },
        None => HealthCheck {
            status: "unused",
            detail: "service does not read the CRM".to_string(),
        },
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: format!("{} MCP service initialized", status.service.display_name()),
        },
        crm,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

pub async fn status_line(State(status): State<ServiceStatus>) -> String {
    format!("{} MCP service is running.", status.service.display_name())
}
