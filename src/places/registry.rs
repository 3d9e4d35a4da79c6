// src/places/registry.rs

use crate::domain::NearbyMatch;
use crate::geo::{distance_miles, Coordinate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read points of interest from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid points of interest file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A named place listings are matched against. Entries without coordinates
/// are kept so reports can list them, but never match anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            lat: Some(coordinate.lat),
            lon: Some(coordinate.lon),
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    points: Vec<PointOfInterest>,
}

impl Registry {
    /// Builds a registry, keeping the first entry for any repeated name.
    pub fn new(points: Vec<PointOfInterest>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(points.len());

        for point in points {
            if !seen.insert(point.name.clone()) {
                warn!(name = %point.name, "⚠️ Duplicate point of interest ignored");
                continue;
            }
            kept.push(point);
        }

        Self { points: kept }
    }

    /// Loads the registry file. A missing or malformed file is fatal for a run.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let points: Vec<PointOfInterest> =
            serde_json::from_str(&text).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let registry = Self::new(points);
        let located = registry.located().count();
        info!(
            total = registry.len(),
            located,
            "Loaded points of interest from {}",
            path.display()
        );
        if located < registry.len() {
            warn!(
                missing = registry.len() - located,
                "⚠️ Some points of interest have no coordinates and will never match"
            );
        }

        Ok(registry)
    }

    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn located(&self) -> impl Iterator<Item = (&PointOfInterest, Coordinate)> {
        self.points
            .iter()
            .filter_map(|p| p.coordinate().map(|c| (p, c)))
    }

    /// Every located point within `radius_miles` of `coord`, closest first.
    pub fn nearby(&self, coord: Coordinate, radius_miles: f64) -> Vec<NearbyMatch> {
        let mut matches: Vec<NearbyMatch> = self
            .located()
            .map(|(p, c)| NearbyMatch {
                name: p.name.clone(),
                distance_miles: distance_miles(coord, c),
            })
            .filter(|m| m.distance_miles <= radius_miles)
            .collect();

        matches.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
        matches
    }

    /// Closest located point regardless of radius.
    pub fn nearest(&self, coord: Coordinate) -> Option<NearbyMatch> {
        self.located()
            .map(|(p, c)| NearbyMatch {
                name: p.name.clone(),
                distance_miles: distance_miles(coord, c),
            })
            .min_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn phoenix() -> Registry {
        Registry::new(vec![
            PointOfInterest::new("Masjid A", Coordinate::new(33.45, -112.07)),
            PointOfInterest::new("Masjid B", Coordinate::new(33.50, -112.10)),
            PointOfInterest::new("Masjid Far", Coordinate::new(32.22, -110.97)),
            PointOfInterest {
                name: "Unlocated".into(),
                lat: None,
                lon: Some(-112.0),
            },
        ])
    }

    #[test]
    fn nearby_returns_exactly_points_within_radius_sorted() {
        let registry = phoenix();
        let c = Coordinate::new(33.46, -112.06);
        let radius = 5.0;

        let got = registry.nearby(c, radius);

        let mut expected: Vec<(String, f64)> = registry
            .points()
            .iter()
            .filter_map(|p| p.coordinate().map(|pc| (p.name.clone(), distance_miles(c, pc))))
            .filter(|(_, d)| *d <= radius)
            .collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1));

        let got_pairs: Vec<(String, f64)> =
            got.iter().map(|m| (m.name.clone(), m.distance_miles)).collect();
        assert_eq!(got_pairs, expected);
        assert_eq!(got[0].name, "Masjid A");
        assert!(got.windows(2).all(|w| w[0].distance_miles <= w[1].distance_miles));
    }

    #[test]
    fn nearby_is_empty_when_nothing_in_range() {
        let registry = phoenix();
        assert!(registry.nearby(Coordinate::new(40.0, -100.0), 5.0).is_empty());
    }

    #[test]
    fn unlocated_points_never_match_but_are_kept() {
        let registry = phoenix();
        assert_eq!(registry.len(), 4);
        let names: Vec<_> = registry
            .nearby(Coordinate::new(33.46, -112.0), 500.0)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert!(!names.contains(&"Unlocated".to_string()));
    }

    #[test]
    fn empty_file_loads_as_empty_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let registry = Registry::load(file.path()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.nearest(Coordinate::new(33.45, -112.07)).is_none());
    }

    #[test]
    fn nearest_ignores_radius() {
        let nearest = phoenix().nearest(Coordinate::new(32.0, -111.0)).unwrap();
        assert_eq!(nearest.name, "Masjid Far");
    }

    #[test]
    fn duplicate_names_keep_first() {
        let registry = Registry::new(vec![
            PointOfInterest::new("Dup", Coordinate::new(1.0, 1.0)),
            PointOfInterest::new("Dup", Coordinate::new(2.0, 2.0)),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.points()[0].lat, Some(1.0));
    }

    #[test]
    fn load_tolerates_missing_coordinates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Masjid A", "lat": 33.45, "lon": -112.07}}, {{"name": "No Coords"}}]"#
        )
        .unwrap();

        let registry = Registry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.points()[1].coordinate().is_none());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Registry::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
