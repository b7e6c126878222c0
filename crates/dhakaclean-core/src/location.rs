use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use dhakaclean_schema::GeolocationSample;

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_millis(5000);

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeolocationSample>;
}

/// Location permission denied or no positioning hardware.
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(&self) -> Result<GeolocationSample> {
        bail!("location unavailable")
    }
}

/// A position known up front: configured home location or client-supplied coordinates.
pub struct FixedLocation(pub GeolocationSample);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<GeolocationSample> {
        Ok(self.0)
    }
}

/// Coordinates supplied by the client with the request, if it shared any.
pub struct ClientLocation(pub Option<GeolocationSample>);

#[async_trait]
impl LocationProvider for ClientLocation {
    async fn current_position(&self) -> Result<GeolocationSample> {
        match self.0 {
            Some(sample) => Ok(sample),
            None => bail!("client did not share a location"),
        }
    }
}

/// Single best-effort fetch. Errors and timeouts both yield `None`.
pub async fn locate(provider: &dyn LocationProvider, timeout: Duration) -> Option<GeolocationSample> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(sample)) => Some(sample),
        Ok(Err(err)) => {
            tracing::info!("Location access denied or failed, proceeding with text search: {err}");
            None
        }
        Err(_) => {
            tracing::info!("Location request timed out after {timeout:?}, proceeding with text search");
            None
        }
    }
}
