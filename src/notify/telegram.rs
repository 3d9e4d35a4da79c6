// notify/telegram.rs

use crate::notify::channel::{NotificationChannel, SendFailure, NOTIFY_TIMEOUT};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct TelegramReply {
    ok: bool,
    description: Option<String>,
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramChannel {
    token: String,
    chat_id: String,
    base_url: String,
    client: Client,
}

impl TelegramChannel {
    pub fn new(token: String, chat_id: String) -> Result<Self, SendFailure> {
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| SendFailure::RequestFailed(e.to_string()))?;

        Ok(Self {
            token,
            chat_id,
            base_url: "https://api.telegram.org".to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    fn send(&self, message: &str) -> Result<(), SendFailure> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);

        let resp = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
            })
            .send()
            .map_err(|e| SendFailure::RequestFailed(e.to_string()))?;

        let status = resp.status();
        let reply: TelegramReply = resp
            .json()
            .map_err(|e| SendFailure::ApiError(format!("{status}: unreadable reply: {e}")))?;

        if !status.is_success() || !reply.ok {
            return Err(SendFailure::ApiError(
                reply
                    .description
                    .unwrap_or_else(|| format!("Telegram returned {status}")),
            ));
        }

        info!("✅ Telegram message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn send_via(server: &MockServer) -> Result<(), SendFailure> {
        let base = server.uri();
        tokio::task::spawn_blocking(move || {
            TelegramChannel::new("123:abc".into(), "-100200300".into())?
                .with_base_url(base)
                .send("🏠 Found 1 homes!")
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn posts_chat_id_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "-100200300",
                "text": "🏠 Found 1 homes!"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(send_via(&server).await, Ok(()));
    }

    #[tokio::test]
    async fn api_description_becomes_the_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        assert_eq!(
            send_via(&server).await,
            Err(SendFailure::ApiError("Bad Request: chat not found".into()))
        );
    }
}
