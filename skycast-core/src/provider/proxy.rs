use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    chat::ChatBackend,
    error::DashboardError,
    gemini::{GenerateContentRequest, GenerateContentResponse},
    model::{AirQuality, Coordinates, FiveDayForecast, Forecast, GeocodedLocation, UvIndex},
};

use super::WeatherSource;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Client for the proxy routes served by `skycast-proxy`.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client for the dashboard proxy")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    #[tracing::instrument(level = "debug", skip(self, query))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, DashboardError> {
        let res = self
            .http
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| DashboardError::Network { endpoint: endpoint.to_string(), source })?;

        decode(endpoint, res).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, res: Response) -> Result<T, DashboardError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| DashboardError::Network { endpoint: endpoint.to_string(), source })?;

    if !status.is_success() {
        tracing::warn!(endpoint, %status, "proxy returned an error");
        return Err(DashboardError::Proxy {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body)
        .map_err(|source| DashboardError::Decode { endpoint: endpoint.to_string(), source })
}

fn coordinate_query(at: Coordinates) -> [(&'static str, String); 2] {
    [("lat", at.lat.to_string()), ("lon", at.lon.to_string())]
}

/// The proxy answers errors as `{"error": "..."}`; anything else is shown truncated.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[async_trait]
impl WeatherSource for ProxyClient {
    async fn forecast(&self, at: Coordinates) -> Result<Forecast> {
        Ok(self.get_json("/api/weather", &coordinate_query(at)).await?)
    }

    async fn air_quality(&self, at: Coordinates) -> Result<AirQuality> {
        Ok(self.get_json("/api/pollution", &coordinate_query(at)).await?)
    }

    async fn five_day_forecast(&self, at: Coordinates) -> Result<FiveDayForecast> {
        Ok(self.get_json("/api/fiveday", &coordinate_query(at)).await?)
    }

    async fn uv_index(&self, at: Coordinates) -> Result<UvIndex> {
        Ok(self.get_json("/api/uv", &coordinate_query(at)).await?)
    }

    async fn geocode(&self, search: &str) -> Result<Vec<GeocodedLocation>> {
        Ok(self.get_json("/api/geocoded", &[("search", search.to_string())]).await?)
    }
}

#[async_trait]
impl ChatBackend for ProxyClient {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let endpoint = "/api/chat";
        let res = self
            .http
            .post(self.url(endpoint))
            .json(request)
            .send()
            .await
            .map_err(|source| DashboardError::Network { endpoint: endpoint.to_string(), source })?;

        Ok(decode(endpoint, res).await?)
    }
}
