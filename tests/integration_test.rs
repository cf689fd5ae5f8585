//! End-to-end checks against a running server (`BASE_URL`, default
//! `http://localhost:8080`). Start the service with default thresholds
//! before running these.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Anomaly {
    kind: String,
    severity: String,
    observed_value: f64,
}

#[derive(Debug, Deserialize)]
struct AnomaliesResponse {
    anomalies: Vec<Anomaly>,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    recommendations: Vec<String>,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

#[tokio::test]
async fn moisture_loss_reported_end_to_end() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();

    let prior = json!({"moisture": 38, "temperature": 25, "humidity": 50, "light": 500});
    let current = json!({"moisture": 20, "temperature": 40, "humidity": 50, "light": 500});

    for body in [prior, current] {
        let status = client
            .post(format!("{}/api/sensors", base))
            .json(&body)
            .send()
            .await?
            .status();
        assert_eq!(status, StatusCode::OK, "ingest failed for {}", body);
    }

    let anomalies: AnomaliesResponse = client
        .get(format!("{}/api/anomalies", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(anomalies.count, anomalies.anomalies.len());

    let loss: Vec<&Anomaly> = anomalies
        .anomalies
        .iter()
        .filter(|a| a.kind == "sudden_moisture_loss")
        .collect();
    assert_eq!(loss.len(), 1, "expected exactly one moisture loss record");
    assert_eq!(loss[0].severity, "critical");
    assert!((loss[0].observed_value - 18.0).abs() < 1e-9);

    let heat = anomalies
        .anomalies
        .iter()
        .find(|a| a.kind == "temperature_extreme")
        .expect("temperature record missing");
    assert_eq!(heat.severity, "critical");

    // critical records lead the list
    assert_eq!(anomalies.anomalies[0].severity, "critical");
    assert_eq!(anomalies.anomalies[1].severity, "critical");

    let recs: RecommendationsResponse = client
        .get(format!("{}/api/recommendations", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(recs.recommendations.len(), anomalies.count);

    Ok(())
}

#[tokio::test]
async fn invalid_reading_rejected() -> Result<()> {
    // ---
    let base = base_url();
    let client = Client::new();

    let response = client
        .post(format!("{}/api/sensors", base))
        .json(&json!({"moisture": "soggy", "temperature": 25, "humidity": 50, "light": 500}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["field"], "moisture");

    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    // ---
    let body: serde_json::Value = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    tokio_test::assert_ok!(serde_json::from_value::<u64>(body["history_len"].clone()));

    Ok(())
}

#[tokio::test]
async fn truncated_body_gets_json_error() -> Result<()> {
    // ---
    let response = Client::new()
        .post(format!("{}/api/sensors", base_url()))
        .body(r#"{"moisture": 30, "temp"#)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert!(body["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn yield_forecast_served() -> Result<()> {
    // ---
    let body: serde_json::Value = Client::new()
        .get(format!("{}/api/yield", base_url()))
        .send()
        .await?
        .json()
        .await?;

    let kg = body["prediction"]["predicted_yield_kg_per_ha"]
        .as_f64()
        .expect("predicted yield missing");
    assert!((2000.0..=8000.0).contains(&kg));
    tokio_test::assert_ok!(serde_json::from_value::<u32>(
        body["prediction"]["days_to_harvest"].clone()
    ));

    Ok(())
}
