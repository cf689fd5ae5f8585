//! Configuration loader for the `agrisense` service.
//!
//! All tunables, including every anomaly threshold, are read here once at
//! startup from environment variables (with optional `.env` file support
//! provided by the caller). Nothing else in the crate calls `env::var` for
//! configuration, and the resulting [`Config`] is never mutated afterwards.
//!
//! The threshold defaults are illustrative sample values, not agronomic
//! reference data; they exist to be overridden.
use std::env;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

/// Parse an optional environment variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Named numeric limits consulted by the anomaly checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    // ---
    /// Percentage-point moisture drop between consecutive readings.
    pub moisture_sudden_drop_pct: f64,

    /// Warning above this temperature (°C).
    pub temperature_high: f64,

    /// Critical above this temperature (°C).
    pub temperature_high_critical: f64,

    /// Warning below this temperature (°C).
    pub temperature_low: f64,

    /// Critical below this temperature (°C).
    pub temperature_low_critical: f64,

    /// Fungal-risk humidity (%).
    pub humidity_high: f64,

    /// Water-stress humidity (%).
    pub humidity_low: f64,

    /// Minimum expected daylight intensity (lux).
    pub light_low_lux: f64,

    /// First UTC hour considered daylight.
    pub daylight_start_hour: u32,

    /// First UTC hour no longer considered daylight.
    pub daylight_end_hour: u32,

    /// `|z|` above which a value is a statistical outlier.
    pub zscore_cutoff: f64,

    /// Minimum history length before z-scores are computed.
    pub zscore_min_samples: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            moisture_sudden_drop_pct: 15.0,
            temperature_high: 38.0,
            temperature_high_critical: 39.0,
            temperature_low: 10.0,
            temperature_low_critical: 5.0,
            humidity_high: 90.0,
            humidity_low: 25.0,
            light_low_lux: 200.0,
            daylight_start_hour: 6,
            daylight_end_hour: 20,
            zscore_cutoff: 3.0,
            zscore_min_samples: 3,
        }
    }
}

impl Thresholds {
    /// Reject combinations the checks cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<()> {
        // ---
        let finite = [
            ("MOISTURE_SUDDEN_DROP_PCT", self.moisture_sudden_drop_pct),
            ("TEMPERATURE_HIGH", self.temperature_high),
            ("TEMPERATURE_HIGH_CRITICAL", self.temperature_high_critical),
            ("TEMPERATURE_LOW", self.temperature_low),
            ("TEMPERATURE_LOW_CRITICAL", self.temperature_low_critical),
            ("HUMIDITY_HIGH", self.humidity_high),
            ("HUMIDITY_LOW", self.humidity_low),
            ("LIGHT_LOW_LUX", self.light_low_lux),
            ("ZSCORE_CUTOFF", self.zscore_cutoff),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                bail!("{} must be a finite number, got {}", name, value);
            }
        }

        if self.temperature_low >= self.temperature_high {
            bail!(
                "TEMPERATURE_LOW ({}) must be below TEMPERATURE_HIGH ({})",
                self.temperature_low,
                self.temperature_high
            );
        }
        if self.temperature_high_critical < self.temperature_high {
            bail!(
                "TEMPERATURE_HIGH_CRITICAL ({}) must not be below TEMPERATURE_HIGH ({})",
                self.temperature_high_critical,
                self.temperature_high
            );
        }
        if self.temperature_low_critical > self.temperature_low {
            bail!(
                "TEMPERATURE_LOW_CRITICAL ({}) must not be above TEMPERATURE_LOW ({})",
                self.temperature_low_critical,
                self.temperature_low
            );
        }
        if self.daylight_start_hour > 24 || self.daylight_end_hour > 24 {
            bail!("DAYLIGHT_START_HOUR and DAYLIGHT_END_HOUR must be within 0..=24");
        }
        if self.zscore_cutoff <= 0.0 {
            bail!("ZSCORE_CUTOFF must be positive, got {}", self.zscore_cutoff);
        }
        if self.zscore_min_samples < 2 {
            bail!(
                "ZSCORE_MIN_SAMPLES must be at least 2, got {}",
                self.zscore_min_samples
            );
        }

        Ok(())
    }

    /// Whether `hour` (UTC, 0..24) falls inside the daylight window. A window
    /// whose start is after its end wraps past midnight.
    pub fn is_daylight(&self, hour: u32) -> bool {
        // ---
        let (start, end) = (self.daylight_start_hour, self.daylight_end_hour);
        if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }
}

/// Season-level inputs to the yield forecast that no sensor measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Season {
    /// Total rainfall so far this season (mm).
    pub rainfall_total_mm: f64,

    /// Days since planting.
    pub growing_days: u32,
}

impl Default for Season {
    fn default() -> Self {
        Season {
            rainfall_total_mm: 450.0,
            growing_days: 65,
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,

    /// Maximum number of readings kept in the rolling history.
    pub history_capacity: usize,

    /// Anomaly check limits.
    pub thresholds: Thresholds,

    /// Yield forecast inputs.
    pub season: Season,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0:8080".to_string(),
            history_capacity: 100,
            thresholds: Thresholds::default(),
            season: Season::default(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `HISTORY_CAPACITY` – rolling window size (default: 100)
/// - one upper-case variable per [`Thresholds`] field, e.g. `TEMPERATURE_HIGH`
/// - `RAINFALL_TOTAL_MM`, `GROWING_DAYS` – season inputs (default: 450, 65)
///
/// Returns an error if any variable fails to parse or the thresholds are
/// inconsistent.
pub fn load_from_env() -> Result<Config> {
    // ---
    let d = Thresholds::default();

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let history_capacity = parse_env!("HISTORY_CAPACITY", usize, 100);

    let thresholds = Thresholds {
        moisture_sudden_drop_pct: parse_env!(
            "MOISTURE_SUDDEN_DROP_PCT",
            f64,
            d.moisture_sudden_drop_pct
        ),
        temperature_high: parse_env!("TEMPERATURE_HIGH", f64, d.temperature_high),
        temperature_high_critical: parse_env!(
            "TEMPERATURE_HIGH_CRITICAL",
            f64,
            d.temperature_high_critical
        ),
        temperature_low: parse_env!("TEMPERATURE_LOW", f64, d.temperature_low),
        temperature_low_critical: parse_env!(
            "TEMPERATURE_LOW_CRITICAL",
            f64,
            d.temperature_low_critical
        ),
        humidity_high: parse_env!("HUMIDITY_HIGH", f64, d.humidity_high),
        humidity_low: parse_env!("HUMIDITY_LOW", f64, d.humidity_low),
        light_low_lux: parse_env!("LIGHT_LOW_LUX", f64, d.light_low_lux),
        daylight_start_hour: parse_env!("DAYLIGHT_START_HOUR", u32, d.daylight_start_hour),
        daylight_end_hour: parse_env!("DAYLIGHT_END_HOUR", u32, d.daylight_end_hour),
        zscore_cutoff: parse_env!("ZSCORE_CUTOFF", f64, d.zscore_cutoff),
        zscore_min_samples: parse_env!("ZSCORE_MIN_SAMPLES", usize, d.zscore_min_samples),
    };

    let season = Season {
        rainfall_total_mm: parse_env!("RAINFALL_TOTAL_MM", f64, 450.0),
        growing_days: parse_env!("GROWING_DAYS", u32, 65),
    };

    if history_capacity == 0 {
        return Err(anyhow!("HISTORY_CAPACITY must be at least 1"));
    }
    thresholds.validate()?;
    if !season.rainfall_total_mm.is_finite() {
        bail!("RAINFALL_TOTAL_MM must be a finite number");
    }

    Ok(Config {
        bind_addr,
        history_capacity,
        thresholds,
        season,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let t = &self.thresholds;
        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR                 : {}", self.bind_addr);
        tracing::info!("  HISTORY_CAPACITY          : {}", self.history_capacity);
        tracing::info!("  MOISTURE_SUDDEN_DROP_PCT  : {}", t.moisture_sudden_drop_pct);
        tracing::info!(
            "  TEMPERATURE warn/critical : <{} / >{} , <{} / >{}",
            t.temperature_low,
            t.temperature_high,
            t.temperature_low_critical,
            t.temperature_high_critical
        );
        tracing::info!("  HUMIDITY low/high         : {} / {}", t.humidity_low, t.humidity_high);
        tracing::info!(
            "  LIGHT_LOW_LUX             : {} (daylight {}h-{}h UTC)",
            t.light_low_lux,
            t.daylight_start_hour,
            t.daylight_end_hour
        );
        tracing::info!(
            "  ZSCORE cutoff/min samples : {} / {}",
            t.zscore_cutoff,
            t.zscore_min_samples
        );
        tracing::info!(
            "  SEASON rainfall/days      : {} mm / {}",
            self.season.rainfall_total_mm,
            self.season.growing_days
        );
    }
}
