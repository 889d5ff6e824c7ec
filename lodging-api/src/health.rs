use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use lodging_store::StoreHealth;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub backend: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheck>) {
    let (status, code, message) = match state.store.ping().await {
        Ok(()) => (HealthStatus::Healthy, StatusCode::OK, None),
        Err(err) => {
            tracing::error!("Store health check failed: {}", err);
            (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE, Some(err.to_string()))
        }
    };

    let check = HealthCheck {
        status,
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend().to_string(),
        timestamp: chrono::Utc::now(),
        message,
    };

    (code, Json(check))
}
