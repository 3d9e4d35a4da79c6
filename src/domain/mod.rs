pub mod listing;

pub use listing::{Listing, NearbyMatch, RawRecord};
