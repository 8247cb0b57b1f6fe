//! Geolocation: embedded GPS tags first, network lookup as fallback.

mod embedded;
mod network;

pub use embedded::{dms_to_decimal, read_embedded};
pub use network::{NetworkLocator, parse_response};

use crate::config::GeoConfig;
use crate::error::Result;
use tracing::{debug, warn};

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude, negative in the southern hemisphere.
    pub latitude: f64,
    /// Longitude, negative west of Greenwich.
    pub longitude: f64,
}

/// Resolves a location for an image.
///
/// Never fails: when neither source produces coordinates the result is `None`.
pub struct GeoResolver {
    locator: Option<NetworkLocator>,
}

impl GeoResolver {
    /// Create a resolver from the `[geo]` settings.
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let locator = if config.network_fallback {
            Some(NetworkLocator::new(config)?)
        } else {
            None
        };
        Ok(Self { locator })
    }

    /// A resolver that only reads embedded tags.
    pub const fn embedded_only() -> Self {
        Self { locator: None }
    }

    /// Resolve the location of the image in `bytes`.
    pub async fn resolve(&self, bytes: &[u8]) -> Option<GeoPoint> {
        if let Some(point) = read_embedded(bytes) {
            debug!(
                "Embedded location: {:.6}, {:.6}",
                point.latitude, point.longitude
            );
            return Some(point);
        }

        let locator = self.locator.as_ref()?;
        match locator.locate().await {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("Network location unavailable: {e}");
                None
            }
        }
    }
}
