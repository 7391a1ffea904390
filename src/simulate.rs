use rand::Rng;
use serde::Serialize;

use crate::utils::round_to;

/// A fake sensor reading for demos and UI development.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSample {
    pub pressure: f64,
    pub flow: f64,
    pub tank_level: f64,
}

impl SensorSample {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            pressure: round_to(rng.gen_range(5.0..=15.0), 2),
            flow: round_to(rng.gen_range(0.0..=10.0), 2),
            tank_level: round_to(rng.gen_range(50.0..=100.0), 2),
        }
    }
}
