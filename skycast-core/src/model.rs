use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
};

/// A latitude/longitude pair. Drives every per-location query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Kolkata, used whenever device geolocation is unavailable.
    pub const DEFAULT: Coordinates = Coordinates { lat: 22.5697, lon: 88.3697 };

    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// Bit-exact equality: cache keys and history dedup compare the values the
// provider returned, never rounded ones.
impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MainReadings {
    /// Kelvin.
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// hPa.
    pub pressure: f64,
    /// Percent.
    pub humidity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindReadings {
    /// m/s.
    pub speed: f64,
    pub deg: f64,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SunTimes {
    #[serde(default)]
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Current conditions as returned by the OpenWeather "current weather" endpoint.
///
/// Sections are optional so that a partial payload still deserializes; the
/// widgets decide what they can render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Forecast {
    #[serde(default)]
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub main: Option<MainReadings>,
    /// Meters.
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub wind: Option<WindReadings>,
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub sys: Option<SunTimes>,
    /// Offset from UTC in seconds.
    #[serde(default)]
    pub timezone: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Forecast {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

/// One 3-hourly sample of the five-day forecast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Option<WindReadings>,
    #[serde(default)]
    pub visibility: Option<f64>,
    /// Probability of precipitation, 0..=1.
    #[serde(default)]
    pub pop: f64,
    /// "YYYY-MM-DD HH:MM:SS" in UTC.
    pub dt_txt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// 3-hourly samples covering five days (40 entries from the provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FiveDayForecast {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
    pub city: Option<City>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AqiReading {
    pub aqi: u8,
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Components {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirQualitySample {
    pub dt: i64,
    pub main: AqiReading,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AirQuality {
    #[serde(default)]
    pub list: Vec<AirQualitySample>,
}

impl AirQuality {
    pub fn current(&self) -> Option<&AirQualitySample> {
        self.list.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UvResult {
    pub uv: f64,
    #[serde(default)]
    pub uv_max: Option<f64>,
    #[serde(default)]
    pub uv_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UvIndex {
    #[serde(default)]
    pub result: Option<UvResult>,
}

/// A geocoding match for a free-text place name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocodedLocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_names: Option<HashMap<String, String>>,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GeocodedLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// "Name, State, CC" with the state omitted when absent.
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() => format!("{}, {}, {}", self.name, state, self.country),
            _ => format!("{}, {}", self.name, self.country),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn coordinates_hash_by_exact_value() {
        let mut set = HashSet::new();
        set.insert(Coordinates::new(51.5074, -0.1278));
        set.insert(Coordinates::new(51.5074, -0.1278));
        set.insert(Coordinates::new(51.5075, -0.1278));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn partial_forecast_payload_deserializes() {
        let forecast: Forecast = serde_json::from_value(serde_json::json!({
            "name": "Kolkata",
            "main": {
                "temp": 300.0,
                "feels_like": 303.0,
                "temp_min": 299.0,
                "temp_max": 301.0,
                "pressure": 1008,
                "humidity": 74
            }
        }))
        .expect("partial payload must parse");

        assert_eq!(forecast.name.as_deref(), Some("Kolkata"));
        assert!(forecast.wind.is_none());
        assert!(forecast.condition().is_none());
    }

    #[test]
    fn geocoded_label_skips_missing_state() {
        let loc = GeocodedLocation {
            name: "Singapore".into(),
            local_names: None,
            lat: 1.3521,
            lon: 103.8198,
            country: "SG".into(),
            state: None,
        };

        assert_eq!(loc.label(), "Singapore, SG");
    }
}
