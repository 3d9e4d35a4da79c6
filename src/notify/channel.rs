// notify/channel.rs

use std::time::Duration;
use thiserror::Error;

pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

/// Why a channel could not deliver a message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SendFailure {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("session error: {0}")]
    Session(String),
}

/// One way of getting a message to a person or group. Target and
/// credentials live in the implementing value.
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    fn send(&self, message: &str) -> Result<(), SendFailure>;
}
