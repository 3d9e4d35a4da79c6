// src/store/listing_store.rs

use crate::domain::{Listing, NearbyMatch, RawRecord};
use crate::geo::Coordinate;
use crate::store::snapshot::{load_snapshot, save_snapshot};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Inner {
    listings: Vec<Listing>,
    links: HashSet<String>,
}

/// Matched listings for the current run, unique by link.
///
/// Shared between scan workers: the dedup check and the insert happen under
/// one lock, and snapshot writes are serialized by a second one.
#[derive(Default)]
pub struct ListingStore {
    inner: Mutex<Inner>,
    checkpoint_lock: Mutex<()>,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. from a previous snapshot, so dedup spans runs.
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for listing in listings {
                if listing.nearby.is_empty() || !inner.links.insert(listing.record.link.clone()) {
                    continue;
                }
                inner.listings.push(listing);
            }
        }
        store
    }

    /// Resumes from the snapshot at `path`. Unreadable snapshots start an empty store.
    pub fn resume(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match load_snapshot(path) {
            Ok(listings) => {
                info!(count = listings.len(), "Resumed listings from {}", path.display());
                Self::from_listings(listings)
            }
            Err(e) => {
                warn!("⚠️ Could not read snapshot, starting empty: {e}");
                Self::new()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a listing unless its link is already stored or it has no matches.
    pub fn add(&self, record: RawRecord, coordinate: Coordinate, nearby: Vec<NearbyMatch>) -> bool {
        if nearby.is_empty() {
            debug!(link = %record.link, "refusing listing without nearby matches");
            return false;
        }

        let mut inner = self.lock();
        if inner.links.contains(&record.link) {
            return false;
        }

        inner.links.insert(record.link.clone());
        inner.listings.push(Listing {
            record,
            coordinate,
            nearby,
        });
        true
    }

    pub fn contains(&self, link: &str) -> bool {
        self.lock().links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.lock().listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every listing, in insertion order.
    pub fn all(&self) -> Vec<Listing> {
        self.lock().listings.clone()
    }

    /// Writes the current contents to `path`. Failures are logged and reported
    /// as `false`; the next successful checkpoint corrects the file.
    pub fn checkpoint(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let _serial = self
            .checkpoint_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let listings = self.all();
        match save_snapshot(path, &listings) {
            Ok(()) => {
                info!(count = listings.len(), "💾 Saved listings to {}", path.display());
                true
            }
            Err(e) => {
                warn!("⚠️ Snapshot write failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(link: &str, price: &str) -> RawRecord {
        RawRecord {
            address: "100 W Washington St".into(),
            price: price.into(),
            link: link.into(),
            image: None,
            source: "Homes.com".into(),
            region: "Phoenix".into(),
        }
    }

    fn one_match() -> Vec<NearbyMatch> {
        vec![NearbyMatch {
            name: "Masjid A".into(),
            distance_miles: 0.9,
        }]
    }

    #[test]
    fn same_link_is_stored_once_keeping_the_first() {
        let store = ListingStore::new();
        let c = Coordinate::new(33.46, -112.06);

        assert!(store.add(record("https://x/1", "$300,000"), c, one_match()));
        assert!(!store.add(record("https://x/1", "$999,999"), c, one_match()));

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.price, "$300,000");
    }

    #[test]
    fn listing_without_matches_is_refused() {
        let store = ListingStore::new();
        assert!(!store.add(record("https://x/1", "$1"), Coordinate::new(0.0, 0.0), vec![]));
        assert!(store.is_empty());
        assert!(!store.contains("https://x/1"));
    }

    #[test]
    fn all_keeps_insertion_order() {
        let store = ListingStore::new();
        let c = Coordinate::new(33.46, -112.06);
        for link in ["c", "a", "b"] {
            store.add(record(link, "$1"), c, one_match());
        }
        let links: Vec<_> = store.all().iter().map(|l| l.link().to_string()).collect();
        assert_eq!(links, ["c", "a", "b"]);
    }

    #[test]
    fn concurrent_adds_of_one_link_insert_once() {
        let store = Arc::new(ListingStore::new());
        let c = Coordinate::new(33.46, -112.06);

        let inserted: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    s.spawn(move || store.add(record("https://x/same", &format!("${i}")), c, one_match()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
        });

        assert_eq!(inserted, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn seeded_store_dedups_against_prior_run() {
        let c = Coordinate::new(33.46, -112.06);
        let first = ListingStore::new();
        first.add(record("https://x/1", "$1"), c, one_match());

        let resumed = ListingStore::from_listings(first.all());
        assert!(!resumed.add(record("https://x/1", "$2"), c, one_match()));
        assert!(resumed.add(record("https://x/2", "$2"), c, one_match()));
    }

    #[test]
    fn checkpoint_and_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let store = ListingStore::new();
        store.add(record("https://x/1", "$1"), Coordinate::new(33.46, -112.06), one_match());

        assert!(store.checkpoint(&path));
        let resumed = ListingStore::resume(&path);
        assert_eq!(resumed.all(), store.all());
    }

    #[test]
    fn checkpoint_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListingStore::new();
        assert!(!store.checkpoint(dir.path().join("no/such/dir/listings.json")));
    }

    #[test]
    fn resume_from_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(ListingStore::resume(&path).is_empty());
    }
}
