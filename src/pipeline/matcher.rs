// src/pipeline/matcher.rs

use crate::domain::{NearbyMatch, RawRecord};
use crate::geo::{Coordinate, GeocodeError, Geocoder};
use crate::places::Registry;
use crate::store::ListingStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_RADIUS_MILES: f64 = 5.0;

/// What happened to one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Stored, with the closest point of interest first.
    Matched(Vec<NearbyMatch>),
    /// Link already stored; nothing was geocoded.
    Duplicate,
    /// Both geocode attempts failed.
    GeocodeFailed(GeocodeError),
    /// Geocoded, but no point of interest within the radius.
    OutOfRange { nearest: Option<NearbyMatch> },
}

/// Geocodes raw records and keeps the ones near a point of interest.
///
/// Cheap to share across scan workers: the store and the geocoder carry
/// their own locking.
pub struct MatchingPipeline {
    geocoder: Arc<dyn Geocoder>,
    registry: Arc<Registry>,
    store: Arc<ListingStore>,
    radius_miles: f64,
    locality_suffix: Option<String>,
}

impl MatchingPipeline {
    pub fn new(geocoder: Arc<dyn Geocoder>, registry: Arc<Registry>, store: Arc<ListingStore>) -> Self {
        Self {
            geocoder,
            registry,
            store,
            radius_miles: DEFAULT_RADIUS_MILES,
            locality_suffix: None,
        }
    }

    pub fn with_radius(mut self, radius_miles: f64) -> Self {
        self.radius_miles = radius_miles;
        self
    }

    /// Appended after the region on the retry address, e.g. a state code.
    pub fn with_locality_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.locality_suffix = (!suffix.trim().is_empty()).then(|| suffix.trim().to_string());
        self
    }

    pub fn store(&self) -> &Arc<ListingStore> {
        &self.store
    }

    pub fn process(&self, mut record: RawRecord) -> MatchOutcome {
        if self.store.contains(&record.link) {
            debug!(link = %record.link, "already stored");
            return MatchOutcome::Duplicate;
        }

        record.address = record.address.trim().to_string();

        let coord = match self.locate(&record) {
            Ok(c) => c,
            Err(e) => {
                warn!(address = %record.address, source = %record.source, "❌ Geocode failed: {e}");
                return MatchOutcome::GeocodeFailed(e);
            }
        };

        let nearby = self.registry.nearby(coord, self.radius_miles);
        if nearby.is_empty() {
            let nearest = self.registry.nearest(coord);
            match &nearest {
                Some(n) => info!(
                    address = %record.address,
                    "Skipped: nearest point is {} at {:.2} mi (> {})",
                    n.name,
                    n.distance_miles,
                    self.radius_miles
                ),
                None => info!(address = %record.address, "Skipped: no located points of interest"),
            }
            return MatchOutcome::OutOfRange { nearest };
        }

        info!(
            address = %record.address,
            source = %record.source,
            "✅ MATCH near {} ({:.2} mi)",
            nearby[0].name,
            nearby[0].distance_miles
        );

        if self.store.add(record, coord, nearby.clone()) {
            MatchOutcome::Matched(nearby)
        } else {
            // Another worker stored the same link while we were geocoding.
            MatchOutcome::Duplicate
        }
    }

    fn locate(&self, record: &RawRecord) -> Result<Coordinate, GeocodeError> {
        let first = match self.geocoder.resolve(&record.address) {
            Ok(c) => return Ok(c),
            Err(e) => e,
        };

        match self.retry_address(record) {
            Some(full) => {
                debug!(address = %full, "geocode retry with region");
                self.geocoder.resolve(&full)
            }
            None => Err(first),
        }
    }

    /// The region-qualified address, unless the address already names the region.
    fn retry_address(&self, record: &RawRecord) -> Option<String> {
        let region = record.region.trim();
        if region.is_empty() || record.address.to_lowercase().contains(&region.to_lowercase()) {
            return None;
        }

        Some(match &self.locality_suffix {
            Some(suffix) => format!("{}, {region}, {suffix}", record.address),
            None => format!("{}, {region}", record.address),
        })
    }
}

/// Counts of per-record outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub records: usize,
    pub matched: usize,
    pub duplicates: usize,
    pub geocode_failed: usize,
    pub out_of_range: usize,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: &MatchOutcome) {
        self.records += 1;
        match outcome {
            MatchOutcome::Matched(_) => self.matched += 1,
            MatchOutcome::Duplicate => self.duplicates += 1,
            MatchOutcome::GeocodeFailed(_) => self.geocode_failed += 1,
            MatchOutcome::OutOfRange { .. } => self.out_of_range += 1,
        }
    }

    pub fn merge(&mut self, other: OutcomeTally) {
        self.records += other.records;
        self.matched += other.matched;
        self.duplicates += other.duplicates;
        self.geocode_failed += other.geocode_failed;
        self.out_of_range += other.out_of_range;
    }
}
