// scraper/fetcher.rs
use crate::scraper::ScraperError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ZENROWS_ENDPOINT: &str = "https://api.zenrows.com/v1/";
const MAX_BACKOFF_SECS: u64 = 10;
const JITTER_MAX_MILLIS: u64 = 2000;

/// fetch(url) → document or failure.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

/// How pages are requested.
#[derive(Debug, Clone)]
pub enum FetchMode {
    Direct,
    /// Route through the ZenRows scraping proxy.
    ZenRows { api_key: String },
}

pub struct HttpFetcher {
    client: Client,
    mode: FetchMode,
    attempts: u32,
}

impl HttpFetcher {
    pub fn new(mode: FetchMode, timeout: Duration, attempts: u32) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self {
            client,
            mode,
            attempts: attempts.max(1),
        })
    }

    fn try_fetch(&self, url: &str) -> Result<String, ScraperError> {
        let request = match &self.mode {
            FetchMode::Direct => self.client.get(url),
            FetchMode::ZenRows { api_key } => self.client.get(ZENROWS_ENDPOINT).query(&[
                ("url", url),
                ("apikey", api_key.as_str()),
                ("original_status", "true"),
                ("mode", "auto"),
            ]),
        };

        let resp = request
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status} for {url}")));
        }

        if let Some(reason) = block_reason(&text) {
            return Err(ScraperError::Blocked(reason.to_string()));
        }

        Ok(text)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let mut last_err = None;

        for attempt in 1..=self.attempts {
            let start = Instant::now();

            match self.try_fetch(url) {
                Ok(html) => {
                    info!("📄 Fetched {url} (attempt {attempt}) in {:?}", start.elapsed());
                    return Ok(html);
                }
                // Retrying a captcha wall only burns more goodwill.
                Err(e @ ScraperError::Blocked(_)) => {
                    warn!("⚠️ {url}: {e}");
                    return Err(e);
                }
                Err(e) => {
                    warn!("⚠️ Fetch attempt {attempt} for {url} failed in {:?}: {e}", start.elapsed());
                    last_err = Some(e);

                    if attempt < self.attempts {
                        std::thread::sleep(backoff(attempt));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("fetch retry loop failed".into())))
    }
}

fn backoff(attempt: u32) -> Duration {
    let base = std::cmp::min(2 * u64::from(attempt), MAX_BACKOFF_SECS);
    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MILLIS);
    Duration::from_secs(base) + Duration::from_millis(jitter)
}

/// Recognises bot-wall pages served with a 200. A captcha widget alone is
/// not a wall: login forms embed reCAPTCHA next to real listings.
pub fn block_reason(html: &str) -> Option<&'static str> {
    html.contains("unblockrequest").then_some("unblock request page")
}

/// Whether a page carries a captcha. Only meaningful once extraction found nothing.
pub fn looks_like_captcha(html: &str) -> bool {
    html.to_lowercase().contains("captcha")
}
