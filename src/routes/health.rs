// src/routes/health.rs
//! Liveness endpoint for the agrisense service.
//!
//! `GET /health` is what container orchestrators and CI liveness checks
//! hit. It only takes the sensor state's read lock, so it answers as long as
//! the runtime is serving requests. Crop health lives at `/api/health` instead.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    history_len: usize,
    history_capacity: usize,
}

/// Handle `GET /health`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // ---
    let guard = state.sensors.read().await;
    Json(HealthResponse {
        status: "ok",
        history_len: guard.history().len(),
        history_capacity: guard.history().capacity(),
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{Config, SensorState};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_health_reports_window() {
        // ---
        let config = Config {
            history_capacity: 12,
            ..Config::default()
        };
        let sensors = SensorState::new(config.history_capacity, Utc::now()).shared();
        let app = super::super::router(sensors, config);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["history_len"], 0);
        assert_eq!(body["history_capacity"], 12);
    }
}
