//! Anomaly analysis over the current reading and its rolling history.
//!
//! The [`Analyzer`] owns an ordered list of [`Check`] objects and the
//! thresholds they consult. One pass evaluates every check, keeps at most one
//! record per [`AnomalyKind`], orders the survivors by severity (critical
//! first, ties in evaluation order) and attaches one recommended action per
//! kind. The pass is pure: identical input always yields identical output.

use serde::Serialize;

use crate::config::Thresholds;
use crate::history::ReadingHistory;
use crate::models::{Field, TimedReading};

mod checks;

pub use checks::{default_checks, Check};

// ---

/// Ordinal urgency, `Info < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SuddenMoistureLoss,
    TemperatureExtreme,
    HumidityExtreme,
    LowHumidity,
    LowLight,
    MoistureOutlier,
    TemperatureOutlier,
    HumidityOutlier,
    LightOutlier,
}

impl AnomalyKind {
    pub fn outlier(field: Field) -> Self {
        match field {
            Field::Moisture => AnomalyKind::MoistureOutlier,
            Field::Temperature => AnomalyKind::TemperatureOutlier,
            Field::Humidity => AnomalyKind::HumidityOutlier,
            Field::Light => AnomalyKind::LightOutlier,
        }
    }

    /// Fixed operator action for this kind of anomaly.
    pub fn recommendation(self) -> &'static str {
        match self {
            AnomalyKind::SuddenMoistureLoss => {
                "Inspect irrigation system immediately for leaks or malfunctions"
            }
            AnomalyKind::TemperatureExtreme => {
                "Protect crops from temperature stress: shade and irrigate in heat, frost protection in cold"
            }
            AnomalyKind::HumidityExtreme => {
                "Improve ventilation and monitor for fungal disease symptoms"
            }
            AnomalyKind::LowHumidity => "Consider misting or increasing irrigation frequency",
            AnomalyKind::LowLight => "Monitor plant growth; consider supplemental lighting",
            AnomalyKind::MoistureOutlier => "Verify moisture sensor calibration and reading accuracy",
            AnomalyKind::TemperatureOutlier => {
                "Verify temperature sensor calibration and reading accuracy"
            }
            AnomalyKind::HumidityOutlier => "Verify humidity sensor calibration and reading accuracy",
            AnomalyKind::LightOutlier => "Verify light sensor calibration and reading accuracy",
        }
    }
}

/// One rule match for one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
    pub observed_value: f64,
    pub threshold_or_baseline: f64,
}

/// Result of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub anomalies: Vec<AnomalyRecord>,
    pub recommendations: Vec<String>,
}

impl Analysis {
    pub fn is_clear(&self) -> bool {
        self.anomalies.is_empty()
    }
}

pub struct Analyzer {
    // ---
    checks: Vec<Box<dyn Check>>,
    thresholds: Thresholds,
}

impl Analyzer {
    /// Analyzer running the built-in checks.
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_checks(thresholds, default_checks())
    }

    /// Analyzer running exactly `checks`, in the given order.
    pub fn with_checks(thresholds: Thresholds, checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks, thresholds }
    }

    /// Evaluate every check for `current` against the readings that preceded
    /// it.
    pub fn analyze(&self, current: &TimedReading, history: &ReadingHistory) -> Analysis {
        // ---
        let mut anomalies: Vec<AnomalyRecord> = Vec::new();

        for check in &self.checks {
            let Some(record) = check.evaluate(current, history, &self.thresholds) else {
                continue;
            };
            if anomalies.iter().any(|a| a.kind == record.kind) {
                tracing::trace!("Dropping duplicate {:?} record", record.kind);
                continue;
            }
            anomalies.push(record);
        }

        // sort_by_key is stable, so evaluation order survives within a severity
        anomalies.sort_by_key(|a| std::cmp::Reverse(a.severity));

        let recommendations = anomalies
            .iter()
            .map(|a| a.kind.recommendation().to_string())
            .collect();

        tracing::debug!(
            "Analyzed reading at {} against {} prior readings: {} anomalies",
            current.timestamp,
            history.len(),
            anomalies.len()
        );

        Analysis {
            anomalies,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::SensorReading;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn reading(moisture: f64, temperature: f64, humidity: f64, light: f64) -> SensorReading {
        SensorReading {
            moisture,
            temperature,
            humidity,
            light,
        }
    }

    fn history_of(readings: &[SensorReading]) -> ReadingHistory {
        // ---
        let mut history = ReadingHistory::new(100);
        for (i, r) in readings.iter().enumerate() {
            history.push(r.at(noon() - Duration::minutes((readings.len() - i) as i64)));
        }
        history
    }

    /// Always reports the same kind, to exercise deduplication.
    struct Always(AnomalyKind, Severity);

    impl Check for Always {
        fn kind(&self) -> AnomalyKind {
            self.0
        }

        fn evaluate(
            &self,
            _current: &TimedReading,
            _history: &ReadingHistory,
            _thresholds: &Thresholds,
        ) -> Option<AnomalyRecord> {
            Some(AnomalyRecord {
                kind: self.0,
                severity: self.1,
                message: format!("{:?}", self.1),
                observed_value: 0.0,
                threshold_or_baseline: 0.0,
            })
        }
    }

    #[test]
    fn test_normal_reading_empty_history_is_clear() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        let analysis = analyzer.analyze(
            &reading(45.0, 25.0, 65.0, 600.0).at(noon()),
            &ReadingHistory::new(100),
        );

        assert!(analysis.is_clear());
        assert!(analysis.anomalies.is_empty());
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_moisture_loss_and_heat_example() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        let history = history_of(&[reading(38.0, 25.0, 50.0, 500.0)]);
        let analysis = analyzer.analyze(&reading(20.0, 40.0, 50.0, 500.0).at(noon()), &history);

        let kinds: Vec<(AnomalyKind, Severity)> = analysis
            .anomalies
            .iter()
            .map(|a| (a.kind, a.severity))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (AnomalyKind::SuddenMoistureLoss, Severity::Critical),
                (AnomalyKind::TemperatureExtreme, Severity::Critical),
            ]
        );
        assert_eq!(
            analysis.recommendations,
            vec![
                AnomalyKind::SuddenMoistureLoss.recommendation().to_string(),
                AnomalyKind::TemperatureExtreme.recommendation().to_string(),
            ]
        );
    }

    #[test]
    fn test_moisture_loss_present_exactly_once() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        for drop in [15.0, 16.5, 30.0, 44.0] {
            let history = history_of(&[reading(45.0, 25.0, 65.0, 600.0)]);
            let analysis =
                analyzer.analyze(&reading(45.0 - drop, 25.0, 65.0, 600.0).at(noon()), &history);
            let count = analysis
                .anomalies
                .iter()
                .filter(|a| a.kind == AnomalyKind::SuddenMoistureLoss)
                .count();
            assert_eq!(count, 1, "drop of {} should fire once", drop);
        }
    }

    #[test]
    fn test_ordered_by_severity_stable_within_severity() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        // humidity high (warning), low light (info), heat (warning)
        let analysis = analyzer.analyze(
            &reading(45.0, 38.5, 95.0, 50.0).at(noon()),
            &ReadingHistory::new(100),
        );

        let kinds: Vec<AnomalyKind> = analysis.anomalies.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AnomalyKind::TemperatureExtreme,
                AnomalyKind::HumidityExtreme,
                AnomalyKind::LowLight,
            ]
        );
        assert_eq!(analysis.recommendations.len(), 3);
        assert_eq!(
            analysis.recommendations[2],
            AnomalyKind::LowLight.recommendation()
        );
    }

    #[test]
    fn test_duplicate_kinds_collapsed() {
        // ---
        let analyzer = Analyzer::with_checks(
            Thresholds::default(),
            vec![
                Box::new(Always(AnomalyKind::LowLight, Severity::Info)),
                Box::new(Always(AnomalyKind::LowLight, Severity::Critical)),
                Box::new(Always(AnomalyKind::HumidityExtreme, Severity::Warning)),
            ],
        );
        let analysis = analyzer.analyze(
            &SensorReading::default().at(noon()),
            &ReadingHistory::new(10),
        );

        assert_eq!(analysis.anomalies.len(), 2);
        assert_eq!(analysis.anomalies[0].kind, AnomalyKind::HumidityExtreme);
        assert_eq!(analysis.anomalies[1].kind, AnomalyKind::LowLight);
        assert_eq!(analysis.anomalies[1].severity, Severity::Info);
        assert_eq!(analysis.recommendations.len(), 2);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        let history = history_of(&[
            reading(50.0, 24.0, 60.0, 700.0),
            reading(49.0, 25.0, 61.0, 650.0),
            reading(51.0, 26.0, 59.0, 720.0),
            reading(50.0, 25.0, 60.0, 690.0),
        ]);
        let current = reading(20.0, 41.0, 92.0, 90.0).at(noon());

        let first = analyzer.analyze(&current, &history);
        let second = analyzer.analyze(&current, &history);
        assert_eq!(first, second);
        assert!(!first.is_clear());
    }

    #[test]
    fn test_statistical_outliers_follow_rule_checks() {
        // ---
        let analyzer = Analyzer::new(Thresholds::default());
        let history = history_of(&[
            reading(45.0, 24.0, 60.0, 600.0),
            reading(46.0, 26.0, 61.0, 610.0),
            reading(45.0, 24.0, 60.0, 600.0),
            reading(46.0, 26.0, 61.0, 610.0),
        ]);
        // temperature z = 5 but within rule bounds
        let analysis = analyzer.analyze(&reading(45.5, 30.0, 60.5, 605.0).at(noon()), &history);

        assert_eq!(analysis.anomalies.len(), 1);
        assert_eq!(analysis.anomalies[0].kind, AnomalyKind::TemperatureOutlier);
        assert_eq!(
            analysis.recommendations,
            vec!["Verify temperature sensor calibration and reading accuracy".to_string()]
        );
    }

    #[test]
    fn test_severity_order() {
        // ---
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), "critical");
        assert_eq!(
            serde_json::to_value(AnomalyKind::SuddenMoistureLoss).unwrap(),
            "sudden_moisture_loss"
        );
    }
}
