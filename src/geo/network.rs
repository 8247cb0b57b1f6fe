//! Coarse network-based location lookup.

use crate::config::GeoConfig;
use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Looks up the approximate location of this machine.
///
/// Successful lookups are reused for `cache_ttl` so a burst of files costs a
/// single request.
pub struct NetworkLocator {
    client: Client,
    url: String,
    cache_ttl: Duration,
    cached: Mutex<Option<(Instant, GeoPoint)>>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    loc: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl NetworkLocator {
    /// Build a locator from the `[geo]` settings.
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Internal {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: config.lookup_url.clone(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            cached: Mutex::new(None),
        })
    }

    /// Current location, from cache when still fresh.
    pub async fn locate(&self) -> Result<GeoPoint> {
        let mut cached = self.cached.lock().await;

        if let Some((at, point)) = *cached
            && at.elapsed() < self.cache_ttl
        {
            debug!("Using cached network location");
            return Ok(point);
        }

        let point = self.fetch().await?;
        *cached = Some((Instant::now(), point));
        Ok(point)
    }

    async fn fetch(&self) -> Result<GeoPoint> {
        debug!("Requesting location from {}", self.url);

        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| lookup_error(&e))?
            .bytes()
            .await
            .map_err(|e| lookup_error(&e))?;

        parse_response(&body)
    }
}

/// Parse a lookup response.
///
/// Accepts `{"loc": "lat,lon"}` and `{"latitude": .., "longitude": ..}`.
pub fn parse_response(body: &[u8]) -> Result<GeoPoint> {
    let response: LookupResponse = serde_json::from_slice(body).map_err(|e| lookup_error(&e))?;

    if let (Some(latitude), Some(longitude)) = (response.latitude, response.longitude) {
        return Ok(GeoPoint {
            latitude,
            longitude,
        });
    }

    let loc = response.loc.ok_or_else(|| Error::GeoLookup {
        reason: "response has no coordinates".to_string(),
    })?;

    let (lat, lon) = loc.split_once(',').ok_or_else(|| Error::GeoLookup {
        reason: format!("malformed loc field: {loc}"),
    })?;

    let parse = |s: &str| {
        s.trim().parse::<f64>().map_err(|e| Error::GeoLookup {
            reason: format!("malformed coordinate '{s}': {e}"),
        })
    };

    Ok(GeoPoint {
        latitude: parse(lat)?,
        longitude: parse(lon)?,
    })
}

fn lookup_error(e: &dyn std::fmt::Display) -> Error {
    Error::GeoLookup {
        reason: e.to_string(),
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::fixtures::serve;
    use super::*;

    fn config(url: &str, ttl: u64) -> GeoConfig {
        GeoConfig {
            network_fallback: true,
            lookup_url: url.to_string(),
            timeout_ms: 2000,
            cache_ttl_secs: ttl,
        }
    }

    #[test]
    fn test_parse_loc_format() {
        let point = parse_response(br#"{"ip":"1.2.3.4","loc":"60.1699,24.9384"}"#).unwrap();
        assert_eq!(point.latitude, 60.1699);
        assert_eq!(point.longitude, 24.9384);
    }

    #[test]
    fn test_parse_lat_lon_format() {
        let point = parse_response(br#"{"latitude":-33.86,"longitude":151.2}"#).unwrap();
        assert_eq!(point.latitude, -33.86);
        assert_eq!(point.longitude, 151.2);
    }

    #[test]
    fn test_parse_rejects_missing_or_malformed() {
        assert!(parse_response(br#"{"ip":"1.2.3.4"}"#).is_err());
        assert!(parse_response(br#"{"loc":"nowhere"}"#).is_err());
        assert!(parse_response(br#"{"loc":"1.0,abc"}"#).is_err());
        assert!(parse_response(b"<html>").is_err());
    }

    #[tokio::test]
    async fn test_locate_caches_result() {
        use std::sync::atomic::Ordering;

        let (url, hits) = serve(r#"{"loc":"10.5,20.25"}"#).await;
        let locator = NetworkLocator::new(&config(&url, 600)).unwrap();

        let first = locator.locate().await.unwrap();
        let second = locator.locate().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.latitude, 10.5);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        use std::sync::atomic::Ordering;

        let (url, hits) = serve(r#"{"latitude":1.0,"longitude":2.0}"#).await;
        let locator = NetworkLocator::new(&config(&url, 0)).unwrap();

        locator.locate().await.unwrap();
        locator.locate().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
