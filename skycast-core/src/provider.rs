use crate::{
    Config,
    model::{AirQuality, Coordinates, FiveDayForecast, Forecast, GeocodedLocation, UvIndex},
    provider::proxy::ProxyClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod proxy;

/// Upstream services the proxy holds API keys for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenUv,
    Gemini,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenUv => "openuv",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Environment variable holding the server-side key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::OpenUv => "OPENUV_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenUv, ProviderId::Gemini]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the per-location weather resources and geocoding matches.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn forecast(&self, at: Coordinates) -> anyhow::Result<Forecast>;

    async fn air_quality(&self, at: Coordinates) -> anyhow::Result<AirQuality>;

    async fn five_day_forecast(&self, at: Coordinates) -> anyhow::Result<FiveDayForecast>;

    async fn uv_index(&self, at: Coordinates) -> anyhow::Result<UvIndex>;

    async fn geocode(&self, search: &str) -> anyhow::Result<Vec<GeocodedLocation>>;
}

/// Build the proxy client from the configured proxy URL.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<ProxyClient>> {
    let url = config.proxy_url()?;
    Ok(Arc::new(ProxyClient::new(url)?))
}
