use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;

use crate::{Analyzer, Config, SharedSensorState, ValidationError};

mod analysis;
mod health;
mod info;
mod sensors;

// ---

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sensors: SharedSensorState,
    pub analyzer: Arc<Analyzer>,
    pub config: Config,
}

pub fn router(sensors: SharedSensorState, config: Config) -> Router {
    // ---
    let analyzer = Arc::new(Analyzer::new(config.thresholds.clone()));

    Router::new()
        .merge(info::router())
        .merge(sensors::router())
        .merge(analysis::router())
        .merge(health::router())
        .with_state(AppState {
            sensors,
            analyzer,
            config,
        })
}

// ---

/// Error body returned for rejected requests.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

/// Handler failure mapped onto an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match self {
            ApiError::Validation(e) => {
                tracing::warn!("Rejected sensor payload: {}", e);
                let body = ErrorResponse {
                    error: e.to_string(),
                    field: e.field(),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}
