mod listing_store;
mod snapshot;

pub use listing_store::ListingStore;
pub use snapshot::{load_snapshot, save_snapshot, SnapshotError};
