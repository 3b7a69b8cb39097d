//! Route tests against wiremock upstreams.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use skycast_proxy::{AppState, ProxyConfig, app};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(mock_server: &MockServer) -> ProxyConfig {
    ProxyConfig {
        openweather_api_key: Some("ow-key".into()),
        openuv_api_key: Some("uv-key".into()),
        gemini_api_key: Some("gm-key".into()),
        openweather_url: mock_server.uri(),
        openuv_url: mock_server.uri(),
        gemini_url: mock_server.uri(),
        gemini_model: "gemini-test".into(),
    }
}

fn router(config: ProxyConfig) -> Router {
    app(AppState::new(config).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cache_control, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let mock_server = MockServer::start().await;
    let (status, _, body) = send(router(config_for(&mock_server)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_weather_relays_upstream_body() {
    let mock_server = MockServer::start().await;
    let upstream = json!({ "name": "Kolkata", "timezone": 19800, "main": { "temp": 303.1 } });

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "22.5697"))
        .and(query_param("lon", "88.3697"))
        .and(query_param("appid", "ow-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, _, body) = send(
        router(config_for(&mock_server)),
        get("/api/weather?lat=22.5697&lon=88.3697"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, upstream);
}

#[tokio::test]
async fn test_missing_key_never_calls_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ProxyConfig { openweather_api_key: None, ..config_for(&mock_server) };
    let (status, _, body) = send(router(config), get("/api/pollution?lat=1&lon=2")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Server misconfiguration" }));
}

#[tokio::test]
async fn test_empty_key_is_missing_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ProxyConfig { openuv_api_key: Some(String::new()), ..config_for(&mock_server) };
    let (status, _, body) = send(router(config), get("/api/uv?lat=1&lon=2")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server misconfiguration");
}

#[tokio::test]
async fn test_upstream_error_is_sanitized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key ow-key. Please see https://openweathermap.org/faq#error401"
        })))
        .mount(&mock_server)
        .await;

    let (status, _, body) = send(router(config_for(&mock_server)), get("/api/weather?lat=1&lon=2")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Error fetching the forecast data" }));
    assert!(!body.to_string().contains("ow-key"));
}

#[tokio::test]
async fn test_fiveday_sets_cache_control() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [], "city": null })))
        .mount(&mock_server)
        .await;

    let (status, cache_control, _) =
        send(router(config_for(&mock_server)), get("/api/fiveday?lat=1&lon=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("public, max-age=3600"));
}

#[tokio::test]
async fn test_uv_uses_header_key_and_lng() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uv"))
        .and(header_eq("x-access-token", "uv-key"))
        .and(query_param("lat", "48.8566"))
        .and(query_param("lng", "2.3522"))
        .and(query_param("alt", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "uv": 6.2 } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, cache_control, body) =
        send(router(config_for(&mock_server)), get("/api/uv?lat=48.8566&lon=2.3522")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("public, max-age=900"));
    assert_eq!(body["result"]["uv"], 6.2);
}

#[tokio::test]
async fn test_geocoded_limits_to_five() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "San Jose"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "ow-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "San Jose", "lat": 37.3362, "lon": -121.8906, "country": "US", "state": "California" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, _, body) =
        send(router(config_for(&mock_server)), get("/api/geocoded?search=San%20Jose")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["state"], "California");
}

#[tokio::test]
async fn test_missing_lat_is_bad_request() {
    let mock_server = MockServer::start().await;
    let (status, _, body) = send(router(config_for(&mock_server)), get("/api/weather?lon=2")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_forwards_contents() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(query_param("key", "gm-key"))
        .and(body_partial_json(json!({ "contents": [{ "parts": [{ "text": "Is it sunny?" }] }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Yes." }] } }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "contents": [{ "parts": [{ "text": "Is it sunny?" }] }] }).to_string()))
        .unwrap();

    let (status, _, body) = send(router(config_for(&mock_server)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "Yes.");
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let mock_server = MockServer::start().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(router(config_for(&mock_server)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_upstream_failure_hides_provider_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Quota exceeded for project 1234" }
        })))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "contents": [] }).to_string()))
        .unwrap();

    let (status, _, body) = send(router(config_for(&mock_server)), request).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({ "error": "Error communicating with the AI service" }));
}
