// config.rs

use crate::geo::MIN_GEOCODE_INTERVAL;
use crate::notify::{
    DigestOptions, KeyedHttpChannel, KeyedProvider, NotificationChannel, SendFailure,
    TelegramChannel, WhatsAppSessionChannel,
};
use crate::scraper::source_by_key;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("unknown notification channel {0:?} (expected none, textmebot, callmebot, telegram or whatsapp-session)")]
    UnknownChannel(String),
    #[error("unknown source {0:?} (expected fsbo, homes or realtor)")]
    UnknownSource(String),
    #[error("could not build notification channel: {0}")]
    Channel(#[from] SendFailure),
}

/// Which channel the digest goes out on, with its credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    None,
    TextMeBot { api_key: String, target: String },
    CallMeBot { api_key: String, phone: String },
    Telegram { token: String, chat_id: String },
    WhatsAppSession { session_dir: PathBuf, group: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub poi_file: PathBuf,
    pub snapshot_file: PathBuf,
    pub report_file: PathBuf,
    pub radius_miles: f64,
    pub regions: Vec<String>,
    pub state_code: String,
    pub locality_suffix: String,
    pub sources: Vec<String>,
    pub scan_workers: usize,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_interval: Duration,
    pub fetch_timeout: Duration,
    pub fetch_attempts: u32,
    pub zenrows_api_key: Option<String>,
    pub channel: ChannelConfig,
    pub digest: DigestOptions,
    pub serve_addr: SocketAddr,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let state_code = env.string("STATE_CODE", "AZ");
        let locality_suffix = match env.get("LOCALITY_SUFFIX") {
            Some(v) if v.eq_ignore_ascii_case("none") => String::new(),
            Some(v) => v,
            None => state_code.clone(),
        };

        let sources = env.list("SOURCES", "fsbo,homes");
        if let Some(bad) = sources.iter().find(|s| source_by_key(s).is_none()) {
            return Err(ConfigError::UnknownSource(bad.clone()));
        }

        let radius_miles: f64 = env.parse("SEARCH_RADIUS_MILES", 5.0)?;
        if !(radius_miles.is_finite() && radius_miles > 0.0) {
            return Err(ConfigError::Invalid {
                key: "SEARCH_RADIUS_MILES",
                value: radius_miles.to_string(),
                reason: "must be a positive number of miles".into(),
            });
        }

        let interval_ms: u64 = env.parse("GEOCODE_MIN_INTERVAL_MS", 1000)?;

        Ok(Self {
            poi_file: env.string("POI_FILE", "places.json").into(),
            snapshot_file: env.string("SNAPSHOT_FILE", "listings.json").into(),
            report_file: env.string("REPORT_FILE", "index.html").into(),
            radius_miles,
            regions: env.list("REGIONS", "Phoenix,Peoria,Glendale,Scottsdale,Chandler,Tempe"),
            state_code,
            locality_suffix,
            sources,
            scan_workers: env.parse::<usize>("SCAN_WORKERS", 1)?.max(1),
            geocoder_url: env.string("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            geocoder_user_agent: env.string("GEOCODER_USER_AGENT", "home_finder/0.1"),
            geocode_interval: Duration::from_millis(interval_ms).max(MIN_GEOCODE_INTERVAL),
            fetch_timeout: Duration::from_secs(env.parse("FETCH_TIMEOUT_SECS", 60)?),
            fetch_attempts: env.parse::<u32>("FETCH_ATTEMPTS", 3)?.max(1),
            zenrows_api_key: env.get("ZENROWS_API_KEY"),
            channel: channel_config(&env)?,
            digest: DigestOptions {
                report_url: env.get("REPORT_URL"),
                signature: env.get("DIGEST_SIGNATURE"),
            },
            serve_addr: env.parse("SERVE_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?,
        })
    }
}

fn channel_config(env: &Env<'_>) -> Result<ChannelConfig, ConfigError> {
    let kind = env.string("NOTIFY_CHANNEL", "none").to_lowercase();

    let channel = match kind.as_str() {
        "none" => ChannelConfig::None,
        "textmebot" => ChannelConfig::TextMeBot {
            api_key: env.required("TEXTMEBOT_APIKEY")?,
            target: env.required("TEXTMEBOT_TARGET")?,
        },
        "callmebot" => ChannelConfig::CallMeBot {
            api_key: env.required("CALLMEBOT_APIKEY")?,
            phone: env.required("CALLMEBOT_PHONE")?,
        },
        "telegram" => ChannelConfig::Telegram {
            token: env.required("TELEGRAM_BOT_TOKEN")?,
            chat_id: env.required("TELEGRAM_CHAT_ID")?,
        },
        "whatsapp-session" | "whatsapp_session" => ChannelConfig::WhatsAppSession {
            session_dir: env.string("WHATSAPP_SESSION_DIR", "wa_session").into(),
            group: env.required("WHATSAPP_GROUP")?,
        },
        _ => return Err(ConfigError::UnknownChannel(kind)),
    };

    Ok(channel)
}

/// The configured channel, or `None` when notifications are off.
pub fn build_channel(config: &Config) -> Result<Option<Box<dyn NotificationChannel>>, ConfigError> {
    let channel: Box<dyn NotificationChannel> = match &config.channel {
        ChannelConfig::None => return Ok(None),
        ChannelConfig::TextMeBot { api_key, target } => Box::new(KeyedHttpChannel::new(
            KeyedProvider::TextMeBot,
            api_key.clone(),
            target.clone(),
        )?),
        ChannelConfig::CallMeBot { api_key, phone } => Box::new(KeyedHttpChannel::new(
            KeyedProvider::CallMeBot,
            api_key.clone(),
            phone.clone(),
        )?),
        ChannelConfig::Telegram { token, chat_id } => {
            Box::new(TelegramChannel::new(token.clone(), chat_id.clone())?)
        }
        ChannelConfig::WhatsAppSession { session_dir, group } => {
            Box::new(WhatsAppSessionChannel::new(session_dir.clone(), group.clone()))
        }
    };

    Ok(Some(channel))
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn list(&self, key: &str, default: &str) -> Vec<String> {
        self.string(key, default)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
