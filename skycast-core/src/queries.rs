use std::sync::Arc;

use crate::{
    cache::{QueryCache, QueryOptions, QueryState},
    model::{AirQuality, Coordinates, FiveDayForecast, Forecast, GeocodedLocation, UvIndex},
    provider::WeatherSource,
};

/// The dashboard's remote resources, one cache per resource, all backed by
/// the same [`WeatherSource`].
#[derive(Debug)]
pub struct WeatherQueries {
    source: Arc<dyn WeatherSource>,
    forecast: QueryCache<Coordinates, Forecast>,
    air_quality: QueryCache<Coordinates, AirQuality>,
    five_day: QueryCache<Coordinates, FiveDayForecast>,
    uv_index: QueryCache<Coordinates, UvIndex>,
    geocoded: QueryCache<String, Vec<GeocodedLocation>>,
}

impl WeatherQueries {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            source,
            forecast: QueryCache::new("forecast", QueryOptions::WEATHER),
            air_quality: QueryCache::new("airQuality", QueryOptions::WEATHER),
            five_day: QueryCache::new("fiveDayForecast", QueryOptions::WEATHER),
            uv_index: QueryCache::new("uvIndex", QueryOptions::WEATHER),
            geocoded: QueryCache::new("geocodedList", QueryOptions::GEOCODING),
        }
    }

    pub async fn forecast(&self, at: Coordinates) -> QueryState<Forecast> {
        let source = self.source.clone();
        self.forecast.fetch(at, || async move { source.forecast(at).await }).await
    }

    pub async fn air_quality(&self, at: Coordinates) -> QueryState<AirQuality> {
        let source = self.source.clone();
        self.air_quality.fetch(at, || async move { source.air_quality(at).await }).await
    }

    pub async fn five_day_forecast(&self, at: Coordinates) -> QueryState<FiveDayForecast> {
        let source = self.source.clone();
        self.five_day.fetch(at, || async move { source.five_day_forecast(at).await }).await
    }

    pub async fn uv_index(&self, at: Coordinates) -> QueryState<UvIndex> {
        let source = self.source.clone();
        self.uv_index.fetch(at, || async move { source.uv_index(at).await }).await
    }

    /// Geocoding matches for `search`. Blank text resolves to an empty list
    /// without going upstream.
    pub async fn geocoded(&self, search: &str) -> QueryState<Vec<GeocodedLocation>> {
        let source = self.source.clone();
        let text = search.to_string();
        self.geocoded
            .fetch(search.to_string(), || async move {
                if text.trim().is_empty() {
                    return Ok(Vec::new());
                }
                source.geocode(&text).await
            })
            .await
    }

    pub async fn geocoded_state(&self, search: &str) -> QueryState<Vec<GeocodedLocation>> {
        self.geocoded.state(&search.to_string()).await
    }

    /// Fetch every per-location resource for `at` concurrently.
    pub async fn dashboard(&self, at: Coordinates) -> DashboardData {
        let (forecast, air_quality, five_day, uv_index) = tokio::join!(
            self.forecast(at),
            self.air_quality(at),
            self.five_day_forecast(at),
            self.uv_index(at),
        );

        DashboardData { at, forecast, air_quality, five_day, uv_index }
    }
}

/// Everything the widget grid renders for one location.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub at: Coordinates,
    pub forecast: QueryState<Forecast>,
    pub air_quality: QueryState<AirQuality>,
    pub five_day: QueryState<FiveDayForecast>,
    pub uv_index: QueryState<UvIndex>,
}

impl DashboardData {
    /// Resources whose last fetch failed, for the error notification.
    pub fn failed_resources(&self) -> Vec<&'static str> {
        [
            ("forecast", self.forecast.is_error()),
            ("air quality", self.air_quality.is_error()),
            ("5-day forecast", self.five_day.is_error()),
            ("UV index", self.uv_index.is_error()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned source recording every call it receives.
    #[derive(Debug, Default)]
    pub struct RecordingSource {
        pub calls: Mutex<Vec<String>>,
        pub places: Vec<GeocodedLocation>,
        pub fail: bool,
    }

    impl RecordingSource {
        fn record(&self, call: String) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail { Err(anyhow!("source unavailable")) } else { Ok(()) }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for RecordingSource {
        async fn forecast(&self, at: Coordinates) -> anyhow::Result<Forecast> {
            self.record(format!("forecast {at}"))?;
            Ok(Forecast { name: Some("Testville".into()), coord: Some(at), ..Forecast::default() })
        }

        async fn air_quality(&self, at: Coordinates) -> anyhow::Result<AirQuality> {
            self.record(format!("air_quality {at}"))?;
            Ok(AirQuality::default())
        }

        async fn five_day_forecast(&self, at: Coordinates) -> anyhow::Result<FiveDayForecast> {
            self.record(format!("five_day {at}"))?;
            Ok(FiveDayForecast { list: vec![], city: None })
        }

        async fn uv_index(&self, at: Coordinates) -> anyhow::Result<UvIndex> {
            self.record(format!("uv {at}"))?;
            Ok(UvIndex::default())
        }

        async fn geocode(&self, search: &str) -> anyhow::Result<Vec<GeocodedLocation>> {
            self.record(format!("geocode {search}"))?;
            Ok(self.places.clone())
        }
    }
}
