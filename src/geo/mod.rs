mod distance;
mod geocoder;

pub use distance::{distance_miles, Coordinate};
pub use geocoder::{
    GeocodeError, Geocoder, NominatimGeocoder, RateLimitedGeocoder, MIN_GEOCODE_INTERVAL,
};
