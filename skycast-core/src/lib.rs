//! Core library for the `skycast` weather dashboard.
//!
//! This crate defines:
//! - Shared domain models for the weather, air quality, UV and geocoding payloads
//! - A keyed cache for remote resources and the dashboard queries built on it
//! - The active location, city search with history, and the unit preference
//! - The chat assistant and the widget view models
//! - The client for the `skycast-proxy` routes, configuration and local storage
//!
//! It is used by `skycast-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod chat;
pub mod clock;
pub mod config;
pub mod daily;
pub mod debounce;
pub mod error;
pub mod gemini;
pub mod history;
pub mod location;
pub mod model;
pub mod provider;
pub mod queries;
pub mod search;
pub mod storage;
pub mod units;
pub mod widgets;

pub use cache::{QueryCache, QueryOptions, QueryState};
pub use chat::{ChatAssistant, ChatBackend, ChatMessage, Role, SendRejected};
pub use config::Config;
pub use error::DashboardError;
pub use history::{SearchHistory, SearchHistoryItem};
pub use location::{FixedGeolocator, Geolocator, LocationError, LocationProvider, NoGeolocator};
pub use model::{Coordinates, Forecast, GeocodedLocation};
pub use provider::{ProviderId, WeatherSource, proxy::ProxyClient};
pub use queries::{DashboardData, WeatherQueries};
pub use search::SearchController;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use units::{Unit, UnitStore};
