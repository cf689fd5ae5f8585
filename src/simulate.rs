//! Random but plausible readings for exercising the dashboard without
//! hardware attached.

use rand::Rng;

use crate::models::SensorReading;

// ---

const MOISTURE: (f64, f64) = (30.0, 60.0);
const TEMPERATURE: (f64, f64) = (20.0, 32.0);
const HUMIDITY: (f64, f64) = (40.0, 80.0);
const LIGHT: (f64, f64) = (300.0, 800.0);

/// Draw each field uniformly from its nominal range.
pub fn random_reading<R: Rng + ?Sized>(rng: &mut R) -> SensorReading {
    SensorReading {
        moisture: rng.gen_range(MOISTURE.0..MOISTURE.1),
        temperature: rng.gen_range(TEMPERATURE.0..TEMPERATURE.1),
        humidity: rng.gen_range(HUMIDITY.0..HUMIDITY.1),
        light: rng.gen_range(LIGHT.0..LIGHT.1),
    }
}
