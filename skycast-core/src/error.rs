use thiserror::Error;

/// Failures talking to the dashboard proxy.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The proxy answered with a non-2xx status. `message` is the sanitized
    /// error text from the proxy body, never the upstream provider's.
    #[error("{endpoint} failed with status {status}: {message}")]
    Proxy {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DashboardError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DashboardError::Proxy { status, .. } => Some(*status),
            _ => None,
        }
    }
}
