//! Data models for sensor readings and their validation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ---

/// Names of the four numeric sensor fields, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Moisture,
    Temperature,
    Humidity,
    Light,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Moisture,
        Field::Temperature,
        Field::Humidity,
        Field::Light,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Moisture => "moisture",
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Light => "light",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::Moisture | Field::Humidity => "%",
            Field::Temperature => "°C",
            Field::Light => " lux",
        }
    }
}

/// Reason a reading was rejected before reaching the history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    Missing(&'static str),

    #[error("field '{0}' must be a number")]
    NotNumeric(&'static str),

    #[error("field '{0}' must be a finite number")]
    NotFinite(&'static str),

    #[error("no sensor fields provided")]
    Empty,
}

impl ValidationError {
    /// The offending field, when the error concerns a single one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Missing(f)
            | ValidationError::NotNumeric(f)
            | ValidationError::NotFinite(f) => Some(f),
            ValidationError::MalformedBody(_)
            | ValidationError::NotAnObject
            | ValidationError::Empty => None,
        }
    }
}

/// Decode a request body as JSON regardless of its declared content type.
/// A body that is empty or only whitespace yields `None`.
pub fn parse_body(bytes: &[u8]) -> Result<Option<Value>, ValidationError> {
    // ---
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))
}

/// One snapshot of the four sensor values.
///
/// Out-of-range values (negative light, moisture above 100) are accepted;
/// flagging them is the analyzer's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    // ---
    /// Soil moisture, percent.
    pub moisture: f64,
    /// Air temperature, degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Light intensity, lux.
    pub light: f64,
}

impl Default for SensorReading {
    fn default() -> Self {
        SensorReading {
            moisture: 45.0,
            temperature: 25.0,
            humidity: 65.0,
            light: 600.0,
        }
    }
}

impl SensorReading {
    // ---
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Moisture => self.moisture,
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Light => self.light,
        }
    }

    fn set(&mut self, field: Field, value: f64) {
        match field {
            Field::Moisture => self.moisture = value,
            Field::Temperature => self.temperature = value,
            Field::Humidity => self.humidity = value,
            Field::Light => self.light = value,
        }
    }

    /// Parse a complete reading; every field must be present and finite.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        // ---
        let patch = ReadingPatch::from_json(value)?;
        let mut reading = SensorReading::default();
        for field in Field::ALL {
            let v = patch.get(field).ok_or(ValidationError::Missing(field.name()))?;
            reading.set(field, v);
        }
        Ok(reading)
    }

    /// Stamp the reading with an ingestion time.
    pub fn at(self, timestamp: DateTime<Utc>) -> TimedReading {
        TimedReading {
            timestamp,
            reading: self,
        }
    }
}

/// A reading together with the moment it was ingested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimedReading {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: SensorReading,
}

/// Partial update: any subset of the sensor fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingPatch {
    pub moisture: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
}

impl ReadingPatch {
    // ---
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Moisture => self.moisture,
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Light => self.light,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Extract whichever sensor fields are present. Unknown keys are ignored;
    /// a present field that is not a finite number is rejected.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        // ---
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut patch = ReadingPatch::default();

        for field in Field::ALL {
            let Some(raw) = obj.get(field.name()) else {
                continue;
            };
            let v = raw
                .as_f64()
                .ok_or(ValidationError::NotNumeric(field.name()))?;
            if !v.is_finite() {
                return Err(ValidationError::NotFinite(field.name()));
            }
            match field {
                Field::Moisture => patch.moisture = Some(v),
                Field::Temperature => patch.temperature = Some(v),
                Field::Humidity => patch.humidity = Some(v),
                Field::Light => patch.light = Some(v),
            }
        }

        Ok(patch)
    }

    /// Overlay the present fields onto `base`.
    pub fn apply(&self, base: &SensorReading) -> SensorReading {
        // ---
        let mut merged = *base;
        for field in Field::ALL {
            if let Some(v) = self.get(field) {
                merged.set(field, v);
            }
        }
        merged
    }
}
