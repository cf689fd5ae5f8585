//! Service index: name, version, active configuration and the endpoint
//! catalogue.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Service banner with the endpoint catalogue and active thresholds.
async fn index(State(state): State<AppState>) -> Json<Value> {
    // ---
    Json(json!({
        "name": "agrisense",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "history_capacity": state.config.history_capacity,
        "thresholds": state.config.thresholds,
        "endpoints": {
            "/health": "GET service liveness",
            "/api/sensors": "GET current reading, POST a complete new reading",
            "/api/sensors/update": "POST partial sensor update",
            "/api/simulate": "POST random reading and analyze it",
            "/api/anomalies": "GET anomaly detection results",
            "/api/recommendations": "GET recommended actions",
            "/api/irrigation": "GET irrigation estimate",
            "/api/health": "GET crop health status",
            "/api/yield": "GET yield forecast and optimal harvest date",
            "/api/analyze": "GET full report, POST overrides for a what-if report"
        }
    }))
}
