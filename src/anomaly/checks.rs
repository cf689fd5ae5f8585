//! Individual anomaly checks.
//!
//! Each check is a stateless object answering one question about the current
//! reading, optionally consulting the readings that preceded it. Checks never
//! fail: a check that cannot be evaluated (no previous reading, too little
//! history, flat history) simply reports nothing.

use chrono::Timelike;

use super::{AnomalyKind, AnomalyRecord, Severity};
use crate::config::Thresholds;
use crate::history::ReadingHistory;
use crate::models::{Field, TimedReading};

// ---

/// A single rule evaluated against the current reading.
pub trait Check: Send + Sync {
    /// The kind of record this check produces.
    fn kind(&self) -> AnomalyKind;

    /// `history` holds the readings preceding `current`, oldest first.
    fn evaluate(
        &self,
        current: &TimedReading,
        history: &ReadingHistory,
        thresholds: &Thresholds,
    ) -> Option<AnomalyRecord>;
}

/// The built-in checks in evaluation order.
pub fn default_checks() -> Vec<Box<dyn Check>> {
    // ---
    let mut checks: Vec<Box<dyn Check>> = vec![
        Box::new(SuddenMoistureLoss),
        Box::new(TemperatureExtreme),
        Box::new(HumidityExtreme),
        Box::new(LowHumidity),
        Box::new(LowLight),
    ];
    checks.extend(
        Field::ALL
            .into_iter()
            .map(|field| Box::new(ZScoreOutlier { field }) as Box<dyn Check>),
    );
    checks
}

/// Slack for comparing a difference of two decimal readings against a
/// threshold; `40.3 - 25.3` is not exactly `15.0` in binary floating point.
const DROP_EPSILON: f64 = 1e-9;

/// Moisture fell by at least the configured number of points since the
/// previous reading.
pub struct SuddenMoistureLoss;

impl Check for SuddenMoistureLoss {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::SuddenMoistureLoss
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        history: &ReadingHistory,
        thresholds: &Thresholds,
    ) -> Option<AnomalyRecord> {
        // ---
        let previous = history.latest()?.reading.moisture;
        let now = current.reading.moisture;
        let drop = previous - now;

        (drop + DROP_EPSILON >= thresholds.moisture_sudden_drop_pct).then(|| AnomalyRecord {
            kind: self.kind(),
            severity: Severity::Critical,
            message: format!(
                "Soil moisture dropped {:.1} points from {:.1}% to {:.1}%",
                drop, previous, now
            ),
            observed_value: drop,
            threshold_or_baseline: thresholds.moisture_sudden_drop_pct,
        })
    }
}

pub struct TemperatureExtreme;

impl Check for TemperatureExtreme {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::TemperatureExtreme
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        _history: &ReadingHistory,
        t: &Thresholds,
    ) -> Option<AnomalyRecord> {
        // ---
        let temp = current.reading.temperature;

        let (severity, bound, risk) = if temp > t.temperature_high_critical {
            (Severity::Critical, t.temperature_high_critical, "heat stress")
        } else if temp < t.temperature_low_critical {
            (Severity::Critical, t.temperature_low_critical, "frost")
        } else if temp > t.temperature_high {
            (Severity::Warning, t.temperature_high, "heat stress")
        } else if temp < t.temperature_low {
            (Severity::Warning, t.temperature_low, "frost")
        } else {
            return None;
        };

        Some(AnomalyRecord {
            kind: self.kind(),
            severity,
            message: format!(
                "Temperature at {:.1}°C is beyond {:.1}°C - {} risk",
                temp, bound, risk
            ),
            observed_value: temp,
            threshold_or_baseline: bound,
        })
    }
}

pub struct HumidityExtreme;

impl Check for HumidityExtreme {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::HumidityExtreme
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        _history: &ReadingHistory,
        t: &Thresholds,
    ) -> Option<AnomalyRecord> {
        let humidity = current.reading.humidity;
        (humidity > t.humidity_high).then(|| AnomalyRecord {
            kind: self.kind(),
            severity: Severity::Warning,
            message: format!(
                "Humidity at {:.1}% - fungal disease risk increased",
                humidity
            ),
            observed_value: humidity,
            threshold_or_baseline: t.humidity_high,
        })
    }
}

pub struct LowHumidity;

impl Check for LowHumidity {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::LowHumidity
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        _history: &ReadingHistory,
        t: &Thresholds,
    ) -> Option<AnomalyRecord> {
        let humidity = current.reading.humidity;
        (humidity < t.humidity_low).then(|| AnomalyRecord {
            kind: self.kind(),
            severity: Severity::Info,
            message: format!("Humidity at {:.1}% - water stress possible", humidity),
            observed_value: humidity,
            threshold_or_baseline: t.humidity_low,
        })
    }
}

/// Light below the floor while the sun is expected to be up. Night-time
/// darkness is not an anomaly.
pub struct LowLight;

impl Check for LowLight {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::LowLight
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        _history: &ReadingHistory,
        t: &Thresholds,
    ) -> Option<AnomalyRecord> {
        // ---
        if !t.is_daylight(current.timestamp.hour()) {
            return None;
        }
        let light = current.reading.light;
        (light < t.light_low_lux).then(|| AnomalyRecord {
            kind: self.kind(),
            severity: Severity::Info,
            message: format!(
                "Light intensity at {:.0} lux - may affect photosynthesis",
                light
            ),
            observed_value: light,
            threshold_or_baseline: t.light_low_lux,
        })
    }
}

/// Rolling 3-sigma style outlier test for one field.
pub struct ZScoreOutlier {
    pub field: Field,
}

impl Check for ZScoreOutlier {
    fn kind(&self) -> AnomalyKind {
        AnomalyKind::outlier(self.field)
    }

    fn evaluate(
        &self,
        current: &TimedReading,
        history: &ReadingHistory,
        t: &Thresholds,
    ) -> Option<AnomalyRecord> {
        // ---
        if history.len() < t.zscore_min_samples {
            return None;
        }
        let stats = history.stats(self.field)?;
        if !(stats.stddev.is_finite() && stats.stddev > 0.0) {
            return None;
        }

        let value = current.reading.get(self.field);
        let z = (value - stats.mean) / stats.stddev;
        if z.abs() <= t.zscore_cutoff {
            return None;
        }

        let name = self.field.name();
        Some(AnomalyRecord {
            kind: self.kind(),
            severity: Severity::Warning,
            message: format!(
                "{}{} value {:.1}{} is unusual (z-score {:.2}, rolling mean {:.1}{})",
                name[..1].to_uppercase(),
                &name[1..],
                value,
                self.field.unit(),
                z,
                stats.mean,
                self.field.unit()
            ),
            observed_value: value,
            threshold_or_baseline: stats.mean,
        })
    }
}
