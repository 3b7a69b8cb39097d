use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use skycast_core::ProviderId;
use thiserror::Error;

pub const MISCONFIGURED: &str = "Server misconfiguration";

/// Route failures. Only the sanitized message reaches the client; upstream
/// bodies and key details stay in the server log.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0} API key is not configured")]
    MissingKey(ProviderId),

    #[error("{0}")]
    BadRequest(String),

    #[error("upstream answered {status}")]
    Upstream { status: StatusCode, message: &'static str },

    #[error("upstream request failed: {source}")]
    Transport {
        message: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream sent an unreadable body: {source}")]
    Parse {
        message: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::MissingKey(_) | ProxyError::Transport { .. } | ProxyError::Parse { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text safe to show the client.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::MissingKey(_) => MISCONFIGURED.to_string(),
            ProxyError::BadRequest(reason) => reason.clone(),
            ProxyError::Upstream { message, .. }
            | ProxyError::Transport { message, .. }
            | ProxyError::Parse { message, .. } => message.to_string(),
        }
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        ProxyError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ProxyError {
    fn from(rejection: JsonRejection) -> Self {
        ProxyError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::MissingKey(provider) => {
                tracing::error!(%provider, "{} is not set", provider.env_var());
            }
            ProxyError::BadRequest(reason) => tracing::debug!("rejected request: {reason}"),
            _ => tracing::error!("{self:#}"),
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
