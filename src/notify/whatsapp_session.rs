// notify/whatsapp_session.rs

use crate::notify::channel::{NotificationChannel, SendFailure};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const WHATSAPP_WEB: &str = "https://web.whatsapp.com/";
const LOGIN_TIMEOUT: Duration = Duration::from_secs(600);

const LOGGED_IN_SELECTORS: [&str; 3] = [
    r#"div[contenteditable="true"][data-tab="3"]"#,
    r#"div[aria-label="Chat list"]"#,
    r#"div[data-testid="chat-list"]"#,
];
const QR_SELECTOR: &str = r#"canvas[aria-label="Scan this QR code"]"#;
const SEARCH_BOX: &str = r#"div[contenteditable="true"][data-tab="3"]"#;
const MESSAGE_BOX: &str = r#"footer div[contenteditable="true"]"#;

/// Sends through WhatsApp Web using a browser profile that has already been
/// paired with a phone. The profile directory is the session; without it
/// the channel fails instead of waiting for a QR scan nobody will do.
pub struct WhatsAppSessionChannel {
    session_dir: PathBuf,
    group_name: String,
    login_timeout: Duration,
}

impl WhatsAppSessionChannel {
    pub fn new(session_dir: impl Into<PathBuf>, group_name: impl Into<String>) -> Self {
        Self {
            session_dir: session_dir.into(),
            group_name: group_name.into(),
            login_timeout: LOGIN_TIMEOUT,
        }
    }

    fn check_session(&self) -> Result<(), SendFailure> {
        let paired = std::fs::read_dir(&self.session_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);

        if paired {
            Ok(())
        } else {
            Err(SendFailure::Session(format!(
                "no authenticated session in {}",
                self.session_dir.display()
            )))
        }
    }

    async fn deliver(&self, message: &str) -> Result<(), SendFailure> {
        let config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(&self.session_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .build()
            .map_err(SendFailure::Session)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SendFailure::Session(format!("browser launch failed: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.type_and_send(&browser, message).await;

        if let Err(e) = browser.close().await {
            warn!("⚠️ Browser did not close cleanly: {e}");
        }
        let _ = browser.wait().await;
        events.abort();

        result
    }

    async fn type_and_send(&self, browser: &Browser, message: &str) -> Result<(), SendFailure> {
        let page = browser
            .new_page(WHATSAPP_WEB)
            .await
            .map_err(|e| SendFailure::Session(format!("could not open WhatsApp Web: {e}")))?;

        self.wait_for_login(&page).await?;

        let search = page
            .find_element(SEARCH_BOX)
            .await
            .map_err(|e| SendFailure::Session(format!("search box not found: {e}")))?;
        search
            .click()
            .await
            .map_err(|e| SendFailure::Session(e.to_string()))?;
        search
            .type_str(&self.group_name)
            .await
            .map_err(|e| SendFailure::Session(e.to_string()))?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        search
            .press_key("Enter")
            .await
            .map_err(|e| SendFailure::Session(e.to_string()))?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let input = page.find_element(MESSAGE_BOX).await.map_err(|_| {
            SendFailure::Session(format!("could not find chat input for '{}'", self.group_name))
        })?;
        input
            .click()
            .await
            .map_err(|e| SendFailure::Session(e.to_string()))?;

        // insertText keeps newlines inside one message; typed "\n" would send early.
        let text = serde_json::to_string(message)
            .map_err(|e| SendFailure::Session(e.to_string()))?;
        page.evaluate(format!("document.execCommand('insertText', false, {text})"))
            .await
            .map_err(|e| SendFailure::Session(format!("could not type message: {e}")))?;

        input
            .press_key("Enter")
            .await
            .map_err(|e| SendFailure::Session(e.to_string()))?;

        // Give the client time to push the message out before the browser closes.
        tokio::time::sleep(Duration::from_secs(3)).await;
        info!(group = %self.group_name, "✅ WhatsApp message sent");
        Ok(())
    }

    async fn wait_for_login(&self, page: &Page) -> Result<(), SendFailure> {
        let start = Instant::now();
        let mut asked_for_qr = false;

        while start.elapsed() < self.login_timeout {
            for selector in LOGGED_IN_SELECTORS {
                if page.find_element(selector).await.is_ok() {
                    info!("✅ WhatsApp Web logged in");
                    return Ok(());
                }
            }

            if !asked_for_qr && page.find_element(QR_SELECTOR).await.is_ok() {
                warn!("👉 WhatsApp Web wants a QR scan; the session in {} has expired", self.session_dir.display());
                asked_for_qr = true;
            }

            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        Err(SendFailure::Session(format!(
            "not logged in after {}s",
            self.login_timeout.as_secs()
        )))
    }
}

impl NotificationChannel for WhatsAppSessionChannel {
    fn name(&self) -> &'static str {
        "WhatsApp Web"
    }

    fn send(&self, message: &str) -> Result<(), SendFailure> {
        self.check_session()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| SendFailure::Session(format!("runtime: {e}")))?;

        runtime.block_on(self.deliver(message))
    }
}
