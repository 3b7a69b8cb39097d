//! Calling the third-party providers and relaying their JSON.

use reqwest::RequestBuilder;
use serde_json::Value;

use crate::error::ProxyError;

/// Send `request` and return the upstream JSON unchanged.
///
/// Non-2xx answers keep their status but carry `message` instead of the
/// provider's body, which is only logged.
#[tracing::instrument(level = "debug", skip(request, message))]
pub async fn relay(route: &'static str, request: RequestBuilder, message: &'static str) -> Result<Value, ProxyError> {
    let res = request
        .send()
        .await
        .map_err(|source| ProxyError::Transport { message, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ProxyError::Transport { message, source })?;

    if !status.is_success() {
        tracing::error!(route, %status, body = %truncate_body(&body), "upstream request failed");
        return Err(ProxyError::Upstream { status, message });
    }

    serde_json::from_str(&body).map_err(|source| ProxyError::Parse { message, source })
}

pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_kept() {
        assert_eq!(truncate_body(r#"{"cod":401}"#), r#"{"cod":401}"#);
    }

    #[test]
    fn long_body_is_cut_at_a_char_boundary() {
        let body = "ü".repeat(250);
        let out = truncate_body(&body);

        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }
}
