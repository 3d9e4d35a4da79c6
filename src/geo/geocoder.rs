// geo/geocoder.rs

use crate::geo::Coordinate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Nominatim's usage policy asks for at most one request per second; never go below half that.
pub const MIN_GEOCODE_INTERVAL: Duration = Duration::from_millis(500);

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeocodeError {
    /// The provider answered but had no result for the address.
    #[error("address not found")]
    NotFound,
    /// Network failure, timeout or an unusable response. Safe to skip and continue.
    #[error("transient geocoder error: {0}")]
    Transient(String),
}

/// Address → coordinate capability.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(GEOCODE_TIMEOUT)
            .build()
            .map_err(|e| GeocodeError::Transient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| GeocodeError::Transient(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Transient(format!("geocoder HTTP {status}")));
        }

        let places: Vec<NominatimPlace> = resp
            .json()
            .map_err(|e| GeocodeError::Transient(format!("bad geocoder response: {e}")))?;

        let place = places.first().ok_or(GeocodeError::NotFound)?;

        let lat: f64 = place
            .lat
            .parse()
            .map_err(|e| GeocodeError::Transient(format!("invalid latitude: {e}")))?;
        let lon: f64 = place
            .lon
            .parse()
            .map_err(|e| GeocodeError::Transient(format!("invalid longitude: {e}")))?;

        debug!(address, lat, lon, "geocoded");
        Ok(Coordinate::new(lat, lon))
    }
}

/// Serializes every call to the inner geocoder and keeps at least `interval`
/// between the start of consecutive calls, across all threads sharing it.
pub struct RateLimitedGeocoder<G> {
    inner: G,
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<G: Geocoder> RateLimitedGeocoder<G> {
    pub fn new(inner: G, interval: Duration) -> Self {
        Self {
            inner,
            interval: interval.max(MIN_GEOCODE_INTERVAL),
            last_call: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<G: Geocoder> Geocoder for RateLimitedGeocoder<G> {
    fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        // The guard stays held for the whole request: one outstanding call at a time.
        let mut last = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }

        *last = Some(Instant::now());
        self.inner.resolve(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl Geocoder for CountingGeocoder {
        fn resolve(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GeocodeError::NotFound)
        }
    }

    #[test]
    fn interval_is_floored() {
        let g = RateLimitedGeocoder::new(
            CountingGeocoder { calls: AtomicUsize::new(0) },
            Duration::from_millis(10),
        );
        assert_eq!(g.interval(), MIN_GEOCODE_INTERVAL);
    }

    #[test]
    fn limiter_spaces_calls_across_threads() {
        let g = Arc::new(RateLimitedGeocoder::new(
            CountingGeocoder { calls: AtomicUsize::new(0) },
            Duration::from_millis(500),
        ));

        let start = Instant::now();
        std::thread::scope(|s| {
            for _ in 0..3 {
                let g = Arc::clone(&g);
                s.spawn(move || {
                    let _ = g.resolve("anywhere");
                });
            }
        });

        // Three calls need two full gaps.
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(g.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn nominatim_parses_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "123 Main St, Phoenix, AZ"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "lat": "33.46", "lon": "-112.06", "display_name": "Phoenix" }
            ])))
            .mount(&server)
            .await;

        let base = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            NominatimGeocoder::new(&base, "home_finder-test")?.resolve("123 Main St, Phoenix, AZ")
        })
        .await
        .unwrap();

        assert_eq!(result, Ok(Coordinate::new(33.46, -112.06)));
    }

    #[tokio::test]
    async fn nominatim_empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let base = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            NominatimGeocoder::new(&base, "home_finder-test")?.resolve("nowhere")
        })
        .await
        .unwrap();

        assert_eq!(result, Err(GeocodeError::NotFound));
    }

    #[tokio::test]
    async fn nominatim_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let base = server.uri();
        let result = tokio::task::spawn_blocking(move || {
            NominatimGeocoder::new(&base, "home_finder-test")?.resolve("anything")
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(GeocodeError::Transient(_))));
    }
}
