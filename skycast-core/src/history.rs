//! Recently selected cities, newest first.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    model::{Coordinates, GeocodedLocation},
    storage::{self, SEARCH_HISTORY_KEY, Storage},
};

pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryItem {
    pub id: String,
    /// Text that was typed when the city was picked.
    pub query: String,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Unix milliseconds.
    pub searched_at: i64,
}

impl SearchHistoryItem {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// A history entry before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSearch {
    pub query: String,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
}

impl NewSearch {
    pub fn from_location(query: impl Into<String>, place: &GeocodedLocation) -> Self {
        Self {
            query: query.into(),
            lat: place.lat,
            lon: place.lon,
            name: place.name.clone(),
            country: place.country.clone(),
            state: place.state.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchHistory {
    storage: Arc<dyn Storage>,
    items: Vec<SearchHistoryItem>,
}

impl SearchHistory {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let items = storage::load_json(storage.as_ref(), SEARCH_HISTORY_KEY).unwrap_or_default();
        Self { storage, items }
    }

    pub fn items(&self) -> &[SearchHistoryItem] {
        &self.items
    }

    /// Record a search. An earlier entry for the same coordinates is replaced
    /// and the list is capped at [`MAX_HISTORY`].
    pub fn add(&mut self, search: NewSearch) -> Result<&SearchHistoryItem> {
        let searched_at = Utc::now().timestamp_millis();
        let item = SearchHistoryItem {
            id: format!("{}-{}-{}", search.lat, search.lon, searched_at),
            query: search.query,
            lat: search.lat,
            lon: search.lon,
            name: search.name,
            country: search.country,
            state: search.state,
            searched_at,
        };

        let at = item.coordinates();
        self.items.retain(|existing| existing.coordinates() != at);
        self.items.insert(0, item);
        self.items.truncate(MAX_HISTORY);

        self.persist()?;
        Ok(&self.items[0])
    }

    /// Drop the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        storage::save_json(self.storage.as_ref(), SEARCH_HISTORY_KEY, &self.items)
    }
}
