use crate::domain::RawRecord;
use crate::geo::{Coordinate, GeocodeError, Geocoder};
use crate::places::{PointOfInterest, Registry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const MASJID_A: (f64, f64) = (33.45, -112.07);
pub const MASJID_B: (f64, f64) = (33.4255, -111.9400);

/// Geocoder that answers from a fixed table and remembers every query.
/// Addresses not in the table are `NotFound`.
#[derive(Default)]
pub struct StaticGeocoder {
    table: HashMap<String, Result<Coordinate, GeocodeError>>,
    calls: Mutex<Vec<String>>,
}

impl StaticGeocoder {
    pub fn with(entries: &[(&str, (f64, f64))]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(addr, (lat, lon))| (addr.to_string(), Ok(Coordinate::new(*lat, *lon))))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, address: &str, err: GeocodeError) -> Self {
        self.table.insert(address.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.calls.lock().unwrap().push(address.to_string());
        self.table
            .get(address)
            .cloned()
            .unwrap_or(Err(GeocodeError::NotFound))
    }
}

pub fn two_masjids() -> Registry {
    Registry::new(vec![
        PointOfInterest::new("Masjid A", Coordinate::new(MASJID_A.0, MASJID_A.1)),
        PointOfInterest::new("Masjid B", Coordinate::new(MASJID_B.0, MASJID_B.1)),
    ])
}

/// Writes the registry file the binary would read.
pub fn write_registry(dir: &Path, registry: &Registry) -> PathBuf {
    let path = dir.join("places.json");
    std::fs::write(&path, serde_json::to_string_pretty(registry.points()).unwrap()).unwrap();
    path
}

pub fn record(address: &str, link: &str, region: &str) -> RawRecord {
    RawRecord {
        address: address.into(),
        price: "$425,000".into(),
        link: link.into(),
        image: None,
        source: "ForSaleByOwner".into(),
        region: region.into(),
    }
}
