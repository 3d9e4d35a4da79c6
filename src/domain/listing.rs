// src/domain/listing.rs

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};

/// A listing as extracted from a source page, before geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub address: String,
    pub price: String,
    /// Canonical identity of a listing across sources and scan passes.
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub source: String,
    /// Region (city) whose search page produced the record.
    #[serde(alias = "city")]
    pub region: String,
}

/// A point of interest within the search radius of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyMatch {
    pub name: String,
    #[serde(rename = "distance")]
    pub distance_miles: f64,
}

/// A geocoded record with at least one nearby point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(flatten)]
    pub record: RawRecord,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Ascending by distance, never empty.
    #[serde(alias = "nearby_masjids")]
    pub nearby: Vec<NearbyMatch>,
}

impl Listing {
    pub fn link(&self) -> &str {
        &self.record.link
    }

    /// Closest point of interest.
    pub fn closest(&self) -> Option<&NearbyMatch> {
        self.nearby.first()
    }
}
