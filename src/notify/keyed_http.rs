// notify/keyed_http.rs

use crate::notify::channel::{NotificationChannel, SendFailure, NOTIFY_TIMEOUT};
use reqwest::blocking::Client;
use tracing::{info, warn};

/// WhatsApp gateways that take an API key and a target in a GET query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedProvider {
    /// Target is a phone number or a group id such as `120363040377@g.us`.
    TextMeBot,
    /// Target is the phone number registered with the key.
    CallMeBot,
}

impl KeyedProvider {
    fn default_base_url(self) -> &'static str {
        match self {
            KeyedProvider::TextMeBot => "https://api.textmebot.com",
            KeyedProvider::CallMeBot => "https://api.callmebot.com",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            KeyedProvider::TextMeBot => "send.php",
            KeyedProvider::CallMeBot => "whatsapp.php",
        }
    }

    fn target_param(self) -> &'static str {
        match self {
            KeyedProvider::TextMeBot => "recipient",
            KeyedProvider::CallMeBot => "phone",
        }
    }

    /// Whether a 200 reply is really a refusal. TextMeBot signals those with
    /// a non-2xx status; CallMeBot answers 200 with an error page.
    fn rejects(self, body: &str) -> bool {
        match self {
            KeyedProvider::TextMeBot => false,
            KeyedProvider::CallMeBot => {
                let body = body.trim_start();
                body.get(..5).is_some_and(|head| head.eq_ignore_ascii_case("error"))
                    || body.contains("APIKey is invalid")
            }
        }
    }
}

pub struct KeyedHttpChannel {
    provider: KeyedProvider,
    api_key: String,
    target: String,
    base_url: String,
    client: Client,
}

impl KeyedHttpChannel {
    pub fn new(provider: KeyedProvider, api_key: String, target: String) -> Result<Self, SendFailure> {
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| SendFailure::RequestFailed(e.to_string()))?;

        Ok(Self {
            provider,
            api_key,
            target,
            base_url: provider.default_base_url().to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl NotificationChannel for KeyedHttpChannel {
    fn name(&self) -> &'static str {
        match self.provider {
            KeyedProvider::TextMeBot => "TextMeBot",
            KeyedProvider::CallMeBot => "CallMeBot",
        }
    }

    fn send(&self, message: &str) -> Result<(), SendFailure> {
        let url = format!("{}/{}", self.base_url, self.provider.endpoint());

        let resp = self
            .client
            .get(url)
            .query(&[
                (self.provider.target_param(), self.target.as_str()),
                ("apikey", self.api_key.as_str()),
                ("text", message),
            ])
            .send()
            .map_err(|e| SendFailure::RequestFailed(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());

        if !status.is_success() {
            return Err(SendFailure::ApiError(format!("{status} - {body}")));
        }

        if self.provider.rejects(&body) {
            return Err(SendFailure::ApiError(body.trim().to_string()));
        }
        if body.contains("Error") {
            warn!(channel = self.name(), "⚠️ API response warning: {}", body.trim());
        }

        info!(channel = self.name(), "✅ API request sent: {}", body.trim());
        Ok(())
    }
}
