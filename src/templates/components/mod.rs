pub mod card;
pub mod error;

pub use card::listing_card;
pub use error::html_error_response;
