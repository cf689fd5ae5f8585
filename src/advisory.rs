//! Agronomic advisories derived from a single reading.
//!
//! These are closed-form estimates: an irrigation-need formula, an additive
//! stress score and a seasonal yield curve. They are served next to the
//! anomaly analysis so the dashboard can show one combined, prioritized
//! action plan.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::anomaly::{Analysis, Severity};
use crate::config::Season;
use crate::history::ReadingHistory;
use crate::models::{Field, SensorReading};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationUrgency {
    Low,
    Moderate,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationAdvice {
    pub irrigation_liters_per_sqm: f64,
    pub urgency: IrrigationUrgency,
    pub recommendation: &'static str,
}

/// Estimate irrigation need in litres per square metre, clamped to 0..=100.
pub fn irrigation(reading: &SensorReading, rainfall_last_week_mm: f64) -> IrrigationAdvice {
    // ---
    let need = 100.0 - reading.moisture * 1.2 + reading.temperature * 0.8
        - reading.humidity * 0.3
        - rainfall_last_week_mm * 0.4;
    let need = need.clamp(0.0, 100.0);

    let (urgency, recommendation) = if need > 70.0 {
        (
            IrrigationUrgency::Critical,
            "HIGH PRIORITY: Immediate irrigation needed",
        )
    } else if need > 40.0 {
        (
            IrrigationUrgency::Moderate,
            "MODERATE: Schedule irrigation within 6-12 hours",
        )
    } else {
        (
            IrrigationUrgency::Low,
            "OPTIMAL: Soil moisture levels are adequate",
        )
    };

    IrrigationAdvice {
        irrigation_liters_per_sqm: (need * 100.0).round() / 100.0,
        urgency,
        recommendation,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    ModerateStress,
    HighStress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropHealth {
    pub health_status: HealthStatus,
    pub stress_score: u32,
    pub recommendations: Vec<&'static str>,
}

/// Classify crop stress from the current conditions.
pub fn crop_health(r: &SensorReading) -> CropHealth {
    // ---
    let mut score = 0;

    score += if r.moisture < 30.0 {
        3
    } else if r.moisture < 35.0 {
        2
    } else if r.moisture > 60.0 {
        1
    } else {
        0
    };

    score += if r.temperature > 35.0 {
        3
    } else if r.temperature > 30.0 || r.temperature < 18.0 {
        2
    } else {
        0
    };

    if r.humidity < 35.0 || r.humidity > 85.0 {
        score += 2;
    }
    if r.light < 200.0 {
        score += 2;
    }

    let health_status = match score {
        s if s >= 6 => HealthStatus::HighStress,
        s if s >= 3 => HealthStatus::ModerateStress,
        _ => HealthStatus::Healthy,
    };

    let mut recommendations = Vec::new();
    if r.moisture < 35.0 {
        recommendations.push("Increase irrigation frequency");
    }
    if r.temperature > 30.0 {
        recommendations.push("Provide shade or cooling during peak hours");
    }
    if r.humidity < 40.0 {
        recommendations.push("Consider misting to increase humidity");
    }
    if r.light < 300.0 {
        recommendations.push("Ensure adequate light exposure");
    }
    if recommendations.is_empty() {
        recommendations.push("Maintain current management practices");
    }

    CropHealth {
        health_status,
        stress_score: score,
        recommendations,
    }
}

const BASE_YIELD_KG_PER_HA: f64 = 5000.0;
const MIN_YIELD_KG_PER_HA: f64 = 2000.0;
const MAX_YIELD_KG_PER_HA: f64 = 8000.0;

/// Growing days at which the time factor saturates.
const FULL_MATURITY_DAYS: f64 = 90.0;

/// Latest day considered for harvest.
const LAST_HARVEST_DAY: u32 = 120;

/// Days ahead scanned for the best harvest day, and the scan step.
const HARVEST_WINDOW_DAYS: u32 = 30;
const HARVEST_STEP_DAYS: usize = 5;

/// Mean of each field over `prior` plus `current`.
pub fn season_averages(current: &SensorReading, prior: &ReadingHistory) -> SensorReading {
    // ---
    let mean = |field: Field| match prior.stats(field) {
        Some(stats) => {
            (stats.mean * stats.samples as f64 + current.get(field)) / (stats.samples + 1) as f64
        }
        None => current.get(field),
    };

    SensorReading {
        moisture: mean(Field::Moisture),
        temperature: mean(Field::Temperature),
        humidity: mean(Field::Humidity),
        light: mean(Field::Light),
    }
}

/// Expected yield in kg/ha for season averages `avg` harvested after `days`.
pub fn expected_yield(avg: &SensorReading, rainfall_total_mm: f64, days: u32) -> f64 {
    // ---
    let moisture_factor = (avg.moisture - 35.0) / 20.0;
    let temp_factor = 1.0 - (avg.temperature - 25.0).abs() / 10.0;
    let light_factor = (avg.light - 400.0) / 400.0;
    let rainfall_factor = (rainfall_total_mm - 300.0) / 500.0;
    let time_factor = (days as f64 / FULL_MATURITY_DAYS).min(1.0);

    let kg = BASE_YIELD_KG_PER_HA
        * (1.0
            + moisture_factor * 0.3
            + temp_factor * 0.25
            + light_factor * 0.2
            + rainfall_factor * 0.15
            + time_factor * 0.1);
    kg.clamp(MIN_YIELD_KG_PER_HA, MAX_YIELD_KG_PER_HA)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldForecast {
    pub predicted_yield_kg_per_ha: f64,
    pub optimal_harvest_date: NaiveDate,
    pub days_to_harvest: u32,
    pub current_yield_estimate: f64,
}

/// Scan the coming harvest window in 5-day steps and pick the earliest day
/// with the highest expected yield. Past the last harvest day the only
/// candidate is today.
pub fn yield_forecast(
    avg: &SensorReading,
    season: &Season,
    today: DateTime<Utc>,
) -> YieldForecast {
    // ---
    let start = season.growing_days;
    let end = start
        .saturating_add(HARVEST_WINDOW_DAYS)
        .min(LAST_HARVEST_DAY)
        .max(start);
    let at = |days: u32| (days, expected_yield(avg, season.rainfall_total_mm, days));

    // `start` is always a candidate, even past the last harvest day
    let first = at(start);
    let (best_days, best_kg) = (start..end)
        .step_by(HARVEST_STEP_DAYS)
        .skip(1)
        .map(at)
        .fold(first, |best, c| if c.1 > best.1 { c } else { best });

    let days_to_harvest = best_days - start;
    let round2 = |v: f64| (v * 100.0).round() / 100.0;

    YieldForecast {
        predicted_yield_kg_per_ha: round2(best_kg),
        optimal_harvest_date: (today + Duration::days(days_to_harvest as i64)).date_naive(),
        days_to_harvest,
        current_yield_estimate: round2(first.1),
    }
}

/// Harvest is close enough to start preparing.
const HARVEST_PREP_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Anomaly,
    Irrigation,
    CropHealth,
    HarvestPlanning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedAction {
    pub priority: Severity,
    pub category: Category,
    pub message: String,
    pub action: String,
}

/// Merge critical anomalies, urgent irrigation, high-stress care tips and an
/// imminent harvest into one list, most urgent first.
pub fn action_plan(
    analysis: &Analysis,
    irrigation: &IrrigationAdvice,
    health: &CropHealth,
    harvest: &YieldForecast,
) -> Vec<PlannedAction> {
    // ---
    let mut plan: Vec<PlannedAction> = analysis
        .anomalies
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .map(|a| PlannedAction {
            priority: Severity::Critical,
            category: Category::Anomaly,
            message: a.message.clone(),
            action: a.kind.recommendation().to_string(),
        })
        .collect();

    if irrigation.urgency == IrrigationUrgency::Critical {
        plan.push(PlannedAction {
            priority: Severity::Warning,
            category: Category::Irrigation,
            message: irrigation.recommendation.to_string(),
            action: format!(
                "Irrigate with {} L/m²",
                irrigation.irrigation_liters_per_sqm
            ),
        });
    }

    if health.health_status == HealthStatus::HighStress {
        plan.extend(health.recommendations.iter().map(|tip| PlannedAction {
            priority: Severity::Warning,
            category: Category::CropHealth,
            message: "Crops under high stress".to_string(),
            action: tip.to_string(),
        }));
    }

    if harvest.days_to_harvest <= HARVEST_PREP_DAYS {
        plan.push(PlannedAction {
            priority: Severity::Info,
            category: Category::HarvestPlanning,
            message: format!("Optimal harvest in {} days", harvest.days_to_harvest),
            action: "Prepare for harvest operations".to_string(),
        });
    }

    plan
}
