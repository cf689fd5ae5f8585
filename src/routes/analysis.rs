//! Read-only analysis endpoints.
//!
//! Every handler copies a snapshot of the sensor state under the read lock,
//! releases the lock, and only then runs the analyzer.

use axum::{
    body::Bytes,
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::{ApiError, AppState};
use crate::advisory::{self, CropHealth, IrrigationAdvice, PlannedAction, YieldForecast};
use crate::{parse_body, AnomalyRecord, ReadingPatch, Snapshot, TimedReading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/anomalies", get(anomalies))
        .route("/api/recommendations", get(recommendations))
        .route("/api/irrigation", get(irrigation))
        .route("/api/health", get(crop_health))
        .route("/api/yield", get(yield_prediction))
        .route("/api/analyze", get(analyze_current).post(analyze_what_if))
}

async fn snapshot(state: &AppState) -> Snapshot {
    state.sensors.read().await.snapshot()
}

#[derive(Serialize)]
struct AnomaliesResponse {
    timestamp: DateTime<Utc>,
    anomalies: Vec<AnomalyRecord>,
    count: usize,
}

async fn anomalies(State(state): State<AppState>) -> Json<AnomaliesResponse> {
    // ---
    let snap = snapshot(&state).await;
    let analysis = state.analyzer.analyze(&snap.current, &snap.prior);

    Json(AnomaliesResponse {
        timestamp: Utc::now(),
        count: analysis.anomalies.len(),
        anomalies: analysis.anomalies,
    })
}

#[derive(Serialize)]
struct RecommendationsResponse {
    timestamp: DateTime<Utc>,
    recommendations: Vec<String>,
}

async fn recommendations(State(state): State<AppState>) -> Json<RecommendationsResponse> {
    // ---
    let snap = snapshot(&state).await;
    let analysis = state.analyzer.analyze(&snap.current, &snap.prior);

    Json(RecommendationsResponse {
        timestamp: Utc::now(),
        recommendations: analysis.recommendations,
    })
}

#[derive(Serialize)]
struct IrrigationResponse {
    timestamp: DateTime<Utc>,
    prediction: IrrigationAdvice,
}

async fn irrigation(State(state): State<AppState>) -> Json<IrrigationResponse> {
    let snap = snapshot(&state).await;
    Json(IrrigationResponse {
        timestamp: Utc::now(),
        prediction: advisory::irrigation(&snap.current.reading, 0.0),
    })
}

#[derive(Serialize)]
struct CropHealthResponse {
    timestamp: DateTime<Utc>,
    health: CropHealth,
}

async fn crop_health(State(state): State<AppState>) -> Json<CropHealthResponse> {
    let snap = snapshot(&state).await;
    Json(CropHealthResponse {
        timestamp: Utc::now(),
        health: advisory::crop_health(&snap.current.reading),
    })
}

/// Yield forecast for the season averages of the current reading and the
/// readings before it.
fn forecast(state: &AppState, current: &TimedReading, snap: &Snapshot) -> YieldForecast {
    // ---
    let avg = advisory::season_averages(&current.reading, &snap.prior);
    advisory::yield_forecast(&avg, &state.config.season, Utc::now())
}

#[derive(Serialize)]
struct YieldResponse {
    timestamp: DateTime<Utc>,
    prediction: YieldForecast,
}

async fn yield_prediction(State(state): State<AppState>) -> Json<YieldResponse> {
    let snap = snapshot(&state).await;
    Json(YieldResponse {
        timestamp: Utc::now(),
        prediction: forecast(&state, &snap.current, &snap),
    })
}

/// Combined report served by `/api/analyze`.
#[derive(Serialize)]
struct Report {
    timestamp: DateTime<Utc>,
    sensor_readings: TimedReading,
    irrigation: IrrigationAdvice,
    crop_health: CropHealth,
    yield_prediction: YieldForecast,
    anomalies: Vec<AnomalyRecord>,
    recommendations: Vec<String>,
    action_plan: Vec<PlannedAction>,
}

fn build_report(state: &AppState, current: TimedReading, snap: &Snapshot) -> Report {
    // ---
    let analysis = state.analyzer.analyze(&current, &snap.prior);
    let irrigation = advisory::irrigation(&current.reading, 0.0);
    let crop_health = advisory::crop_health(&current.reading);
    let yield_prediction = forecast(state, &current, snap);
    let action_plan =
        advisory::action_plan(&analysis, &irrigation, &crop_health, &yield_prediction);

    debug!(
        "Report: {} anomalies, {} planned actions",
        analysis.anomalies.len(),
        action_plan.len()
    );

    Report {
        timestamp: Utc::now(),
        sensor_readings: current,
        irrigation,
        crop_health,
        yield_prediction,
        anomalies: analysis.anomalies,
        recommendations: analysis.recommendations,
        action_plan,
    }
}

async fn analyze_current(State(state): State<AppState>) -> Json<Report> {
    let snap = snapshot(&state).await;
    Json(build_report(&state, snap.current, &snap))
}

/// Handle `POST /api/analyze`: evaluate the current reading with the given
/// fields overridden, against the same history. Nothing is ingested; an
/// empty body means no overrides.
async fn analyze_what_if(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Report>, ApiError> {
    // ---
    let patch = match parse_body(&body)? {
        Some(value) => ReadingPatch::from_json(&value)?,
        None => ReadingPatch::default(),
    };
    let snap = snapshot(&state).await;
    let current = patch.apply(&snap.current.reading).at(snap.current.timestamp);

    Ok(Json(build_report(&state, current, &snap)))
}
