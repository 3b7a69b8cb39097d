use clap::Parser;
use skycast_core::ProviderId;
use std::net::SocketAddr;

use crate::error::ProxyError;

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org";
pub const OPENUV_URL: &str = "https://api.openuv.io";
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Parser)]
#[command(name = "skycast-proxy", about = "Proxy routes holding the skycast provider API keys.")]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "SKYCAST_ADDRESS", default_value = "127.0.0.1:3000")]
    pub address: SocketAddr,

    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub openweather_api_key: Option<String>,

    #[arg(long, env = "OPENUV_API_KEY", hide_env_values = true)]
    pub openuv_api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "SKYCAST_OPENWEATHER_URL", default_value = OPENWEATHER_URL)]
    pub openweather_url: String,

    #[arg(long, env = "SKYCAST_OPENUV_URL", default_value = OPENUV_URL)]
    pub openuv_url: String,

    #[arg(long, env = "SKYCAST_GEMINI_URL", default_value = GEMINI_URL)]
    pub gemini_url: String,

    #[arg(long, env = "SKYCAST_GEMINI_MODEL", default_value = GEMINI_MODEL)]
    pub gemini_model: String,
}

/// Keys and upstream locations the routes need.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub openweather_api_key: Option<String>,
    pub openuv_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openweather_url: String,
    pub openuv_url: String,
    pub gemini_url: String,
    pub gemini_model: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            openuv_api_key: None,
            gemini_api_key: None,
            openweather_url: OPENWEATHER_URL.to_string(),
            openuv_url: OPENUV_URL.to_string(),
            gemini_url: GEMINI_URL.to_string(),
            gemini_model: GEMINI_MODEL.to_string(),
        }
    }
}

impl From<Args> for ProxyConfig {
    fn from(args: Args) -> Self {
        Self {
            openweather_api_key: args.openweather_api_key,
            openuv_api_key: args.openuv_api_key,
            gemini_api_key: args.gemini_api_key,
            openweather_url: args.openweather_url,
            openuv_url: args.openuv_url,
            gemini_url: args.gemini_url,
            gemini_model: args.gemini_model,
        }
    }
}

impl ProxyConfig {
    /// Key for `provider`. Unset and empty keys are both missing.
    pub fn api_key(&self, provider: ProviderId) -> Result<&str, ProxyError> {
        let key = match provider {
            ProviderId::OpenWeather => &self.openweather_api_key,
            ProviderId::OpenUv => &self.openuv_api_key,
            ProviderId::Gemini => &self.gemini_api_key,
        };

        key.as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ProxyError::MissingKey(provider))
    }

    pub fn upstream_url(&self, provider: ProviderId, path: &str) -> String {
        let base = match provider {
            ProviderId::OpenWeather => &self.openweather_url,
            ProviderId::OpenUv => &self.openuv_url,
            ProviderId::Gemini => &self.gemini_url,
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}
