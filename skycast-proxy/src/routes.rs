use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use skycast_core::{ProviderId, gemini::GenerateContentRequest};

use crate::{AppState, error::ProxyError, upstream::relay};

const WEATHER_ERROR: &str = "Error fetching the forecast data";
const FIVEDAY_ERROR: &str = "Error in getting the daily data.";
const POLLUTION_ERROR: &str = "Error fetching the pollution data";
const UV_ERROR: &str = "Error getting UV data";
const GEOCODED_ERROR: &str = "Error fetching geocoded data";
const CHAT_ERROR: &str = "Error communicating with the AI service";

const FIVEDAY_CACHE: &str = "public, max-age=3600";
const UV_CACHE: &str = "public, max-age=900";

#[derive(Debug, Deserialize)]
pub struct CoordinateParams {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weather", get(weather))
        .route("/fiveday", get(fiveday))
        .route("/pollution", get(pollution))
        .route("/uv", get(uv))
        .route("/geocoded", get(geocoded))
        .route("/chat", post(chat))
}

async fn openweather(
    state: &AppState,
    route: &'static str,
    path: &str,
    params: &CoordinateParams,
    message: &'static str,
) -> Result<Value, ProxyError> {
    let key = state.config.api_key(ProviderId::OpenWeather)?;
    tracing::info!(route, lat = params.lat, lon = params.lon, "relaying");

    let request = state
        .http
        .get(state.config.upstream_url(ProviderId::OpenWeather, path))
        .query(&[
            ("lat", params.lat.to_string()),
            ("lon", params.lon.to_string()),
            ("appid", key.to_string()),
        ]);

    relay(route, request, message).await
}

async fn weather(
    State(state): State<AppState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(params) = params?;
    let body = openweather(&state, "/api/weather", "/data/2.5/weather", &params, WEATHER_ERROR).await?;
    Ok(Json(body))
}

async fn fiveday(
    State(state): State<AppState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<impl IntoResponse, ProxyError> {
    let Query(params) = params?;
    let body = openweather(&state, "/api/fiveday", "/data/2.5/forecast", &params, FIVEDAY_ERROR).await?;
    Ok(([(header::CACHE_CONTROL, FIVEDAY_CACHE)], Json(body)))
}

async fn pollution(
    State(state): State<AppState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(params) = params?;
    let body = openweather(&state, "/api/pollution", "/data/2.5/air_pollution", &params, POLLUTION_ERROR).await?;
    Ok(Json(body))
}

async fn uv(
    State(state): State<AppState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<impl IntoResponse, ProxyError> {
    let Query(params) = params?;
    let key = state.config.api_key(ProviderId::OpenUv)?;
    tracing::info!(route = "/api/uv", lat = params.lat, lon = params.lon, "relaying");

    let request = state
        .http
        .get(state.config.upstream_url(ProviderId::OpenUv, "/api/v1/uv"))
        .header("x-access-token", key)
        .query(&[
            ("lat", params.lat.to_string()),
            ("lng", params.lon.to_string()),
            ("alt", "100".to_string()),
        ]);

    let body = relay("/api/uv", request, UV_ERROR).await?;
    Ok(([(header::CACHE_CONTROL, UV_CACHE)], Json(body)))
}

async fn geocoded(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(SearchParams { search }) = params?;
    let key = state.config.api_key(ProviderId::OpenWeather)?;
    tracing::info!(route = "/api/geocoded", search = %search, "relaying");

    let request = state
        .http
        .get(state.config.upstream_url(ProviderId::OpenWeather, "/geo/1.0/direct"))
        .query(&[("q", search.as_str()), ("limit", "5"), ("appid", key)]);

    Ok(Json(relay("/api/geocoded", request, GEOCODED_ERROR).await?))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(request) = body?;
    let key = state.config.api_key(ProviderId::Gemini)?;
    tracing::info!(route = "/api/chat", model = %state.config.gemini_model, "relaying");

    let path = format!("/v1beta/models/{}:generateContent", state.config.gemini_model);
    let upstream = state
        .http
        .post(state.config.upstream_url(ProviderId::Gemini, &path))
        .query(&[("key", key)])
        .json(&request);

    Ok(Json(relay("/api/chat", upstream, CHAT_ERROR).await?))
}
