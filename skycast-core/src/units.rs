use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{self, Storage, UNIT_KEY};

const MPS_TO_MPH: f64 = 2.23694;

/// Display unit system. Affects presentation only; all data stays in SI/Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    pub fn toggled(self) -> Self {
        match self {
            Unit::Metric => Unit::Imperial,
            Unit::Imperial => Unit::Metric,
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Unit::Metric => "°C",
            Unit::Imperial => "°F",
        }
    }

    pub fn speed_symbol(self) -> &'static str {
        match self {
            Unit::Metric => "m/s",
            Unit::Imperial => "mph",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest integer, halves rounded up: -0.5 becomes 0, -2.5 becomes -2.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    round_half_up(kelvin - 273.15)
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> i64 {
    round_half_up((kelvin - 273.15) * 9.0 / 5.0 + 32.0)
}

pub fn convert_temperature(kelvin: f64, unit: Unit) -> i64 {
    match unit {
        Unit::Metric => kelvin_to_celsius(kelvin),
        Unit::Imperial => kelvin_to_fahrenheit(kelvin),
    }
}

/// m/s for metric, mph for imperial.
pub fn convert_wind_speed(speed_mps: f64, unit: Unit) -> i64 {
    match unit {
        Unit::Metric => round_half_up(speed_mps),
        Unit::Imperial => round_half_up(speed_mps * MPS_TO_MPH),
    }
}

/// "27°C" / "80°F".
pub fn format_temperature(kelvin: f64, unit: Unit) -> String {
    format!("{}{}", convert_temperature(kelvin, unit), unit.temperature_symbol())
}

/// The persisted unit preference.
#[derive(Debug, Clone)]
pub struct UnitStore {
    storage: Arc<dyn Storage>,
    unit: Unit,
}

impl UnitStore {
    /// Load the stored preference, falling back to metric.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let unit = storage::load_json(storage.as_ref(), UNIT_KEY).unwrap_or_default();
        Self { storage, unit }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Flip metric/imperial and persist the new value.
    pub fn toggle(&mut self) -> Result<Unit> {
        self.set(self.unit.toggled())?;
        Ok(self.unit)
    }

    pub fn set(&mut self, unit: Unit) -> Result<()> {
        storage::save_json(self.storage.as_ref(), UNIT_KEY, &unit)?;
        self.unit = unit;
        tracing::debug!(%unit, "unit preference updated");
        Ok(())
    }
}
