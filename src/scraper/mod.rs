mod fetcher;
mod models;
mod scraper_error;
pub mod sources;

pub use fetcher::{looks_like_captcha, FetchMode, Fetcher, HttpFetcher};
pub use scraper_error::ScraperError;
pub use sources::{source_by_key, SourceExtractor};
