//! The active location every query is keyed on.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::model::Coordinates;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("timed out waiting for a position fix")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

/// Something that can report the device position.
#[async_trait]
pub trait Geolocator: Send + Sync + std::fmt::Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Always reports the same position. Used for a configured home location.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// No positioning capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Shared handle to the active coordinates. Clones observe and update the
/// same value; subscribers see every change.
#[derive(Debug, Clone)]
pub struct LocationProvider {
    inner: Arc<watch::Sender<Coordinates>>,
}

impl Default for LocationProvider {
    fn default() -> Self {
        Self::new(Coordinates::DEFAULT)
    }
}

impl LocationProvider {
    pub fn new(initial: Coordinates) -> Self {
        Self { inner: Arc::new(watch::Sender::new(initial)) }
    }

    pub fn active(&self) -> Coordinates {
        *self.inner.borrow()
    }

    pub fn set_active(&self, at: Coordinates) {
        let changed = self.inner.send_if_modified(|current| {
            if *current == at {
                return false;
            }
            *current = at;
            true
        });
        if changed {
            tracing::info!(%at, "active location changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Coordinates> {
        self.inner.subscribe()
    }

    /// One-shot attempt to replace the active location with the device
    /// position. On any failure the current value stays and a warning is
    /// logged.
    pub async fn locate(&self, geolocator: &dyn Geolocator) -> Coordinates {
        match geolocator.current_position().await {
            Ok(at) => self.set_active(at),
            Err(e) => tracing::warn!("could not determine position, keeping {}: {e}", self.active()),
        }
        self.active()
    }
}
