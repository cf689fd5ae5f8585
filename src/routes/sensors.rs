//! Ingestion endpoints: the only paths that mutate sensor state.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::{
    parse_body, simulate, Analysis, ReadingPatch, SensorReading, TimedReading, ValidationError,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/sensors", get(current).post(ingest))
        .route("/api/sensors/update", post(update))
        .route("/api/simulate", post(simulate_reading))
}

#[derive(Serialize)]
struct CurrentResponse {
    timestamp: DateTime<Utc>,
    data: TimedReading,
    history_len: usize,
}

async fn current(State(state): State<AppState>) -> Json<CurrentResponse> {
    // ---
    let guard = state.sensors.read().await;
    Json(CurrentResponse {
        timestamp: Utc::now(),
        data: *guard.current(),
        history_len: guard.history().len(),
    })
}

#[derive(Serialize)]
struct IngestResponse {
    status: &'static str,
    reading: TimedReading,
}

/// Handle `POST /api/sensors` with a complete reading.
async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    // ---
    let body = parse_body(&body)?.ok_or(ValidationError::NotAnObject)?;
    let reading = SensorReading::from_json(&body)?;
    let entry = state.sensors.write().await.ingest(reading, Utc::now());
    info!("Ingested reading {:?}", entry.reading);

    Ok(Json(IngestResponse {
        status: "success",
        reading: entry,
    }))
}

#[derive(Serialize)]
struct UpdateResponse {
    status: &'static str,
    updated_data: TimedReading,
}

/// Handle `POST /api/sensors/update`: overlay the provided fields onto the
/// current reading and ingest the result.
async fn update(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, ApiError> {
    // ---
    let body = parse_body(&body)?.ok_or(ValidationError::NotAnObject)?;
    let patch = ReadingPatch::from_json(&body)?;
    if patch.is_empty() {
        return Err(ValidationError::Empty.into());
    }

    let entry = {
        let mut guard = state.sensors.write().await;
        let merged = patch.apply(&guard.current().reading);
        guard.ingest(merged, Utc::now())
    };
    info!("Updated reading to {:?}", entry.reading);

    Ok(Json(UpdateResponse {
        status: "success",
        updated_data: entry,
    }))
}

#[derive(Serialize)]
struct SimulateResponse {
    status: &'static str,
    new_sensor_data: TimedReading,
    analysis: Analysis,
}

/// Handle `POST /api/simulate`.
async fn simulate_reading(State(state): State<AppState>) -> Json<SimulateResponse> {
    // ---
    let reading = simulate::random_reading(&mut rand::thread_rng());

    let snapshot = {
        let mut guard = state.sensors.write().await;
        guard.ingest(reading, Utc::now());
        guard.snapshot()
    };
    let analysis = state.analyzer.analyze(&snapshot.current, &snapshot.prior);
    debug!(
        "Simulated reading {:?}, clear: {}",
        snapshot.current.reading,
        analysis.is_clear()
    );

    Json(SimulateResponse {
        status: "simulation_complete",
        new_sensor_data: snapshot.current,
        analysis,
    })
}
