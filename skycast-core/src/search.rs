//! City search: debounced input, geocoding suggestions and selection.

use anyhow::Result;
use std::sync::Arc;

use crate::{
    debounce::{Debounced, SEARCH_DEBOUNCE},
    history::{NewSearch, SearchHistory, SearchHistoryItem},
    location::LocationProvider,
    model::GeocodedLocation,
    queries::WeatherQueries,
};

/// A suggestion shown before anything is typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultCity {
    pub name: &'static str,
    pub country: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl DefaultCity {
    pub fn to_location(&self) -> GeocodedLocation {
        GeocodedLocation {
            name: self.name.to_string(),
            local_names: None,
            lat: self.lat,
            lon: self.lon,
            country: self.country.to_string(),
            state: Some(self.state.to_string()),
        }
    }
}

pub const DEFAULT_CITIES: [DefaultCity; 6] = [
    DefaultCity { name: "Kolkata", country: "IN", state: "West Bengal", lat: 22.5697, lon: 88.3697 },
    DefaultCity { name: "New York", country: "US", state: "New York", lat: 40.7128, lon: -74.0060 },
    DefaultCity { name: "London", country: "GB", state: "England", lat: 51.5074, lon: -0.1278 },
    DefaultCity { name: "Tokyo", country: "JP", state: "Tokyo Metropolis", lat: 35.6895, lon: 139.6917 },
    DefaultCity { name: "Paris", country: "FR", state: "Île-de-France", lat: 48.8566, lon: 2.3522 },
    DefaultCity { name: "Singapore", country: "SG", state: "Singapore", lat: 1.3521, lon: 103.8198 },
];

pub fn default_suggestions() -> Vec<GeocodedLocation> {
    DEFAULT_CITIES.iter().map(DefaultCity::to_location).collect()
}

#[derive(Debug)]
pub struct SearchController {
    queries: Arc<WeatherQueries>,
    location: LocationProvider,
    text: Debounced<String>,
    history: SearchHistory,
}

impl SearchController {
    pub fn new(queries: Arc<WeatherQueries>, location: LocationProvider, history: SearchHistory) -> Self {
        Self {
            queries,
            location,
            text: Debounced::new(String::new(), SEARCH_DEBOUNCE),
            history,
        }
    }

    pub fn handle_input(&self, text: impl Into<String>) {
        self.text.set(text.into());
    }

    pub fn input(&self) -> String {
        self.text.raw()
    }

    /// Text that has survived the debounce window.
    pub fn debounced_input(&self) -> String {
        self.text.current()
    }

    /// Default cities for blank input, otherwise geocoding matches for the
    /// debounced text. Empty while a lookup is pending or after it failed.
    pub async fn suggestions(&self) -> Vec<GeocodedLocation> {
        if self.text.raw().trim().is_empty() {
            return default_suggestions();
        }

        let state = self.queries.geocoded(&self.text.current()).await;
        state.data().cloned().unwrap_or_default()
    }

    pub async fn is_loading(&self) -> bool {
        if !self.text.is_settled() {
            return true;
        }
        self.queries.geocoded_state(&self.text.current()).await.is_fetching
    }

    /// Make `place` the active location, clear the input and record the
    /// search under the text that was typed.
    pub fn select_city(&mut self, place: &GeocodedLocation) -> Result<()> {
        let query = self.text.raw();

        self.location.set_active(place.coordinates());
        self.text.set(String::new());
        self.history.add(NewSearch::from_location(query, place))?;
        Ok(())
    }

    pub fn select_history(&mut self, item: &SearchHistoryItem) -> Result<()> {
        let place = GeocodedLocation {
            name: item.name.clone(),
            local_names: None,
            lat: item.lat,
            lon: item.lon,
            country: item.country.clone(),
            state: item.state.clone(),
        };
        self.select_city(&place)
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SearchHistory {
        &mut self.history
    }
}
