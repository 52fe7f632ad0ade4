//! Operator notifications.
//!
//! Notifications are one-way: `notify` returns immediately and the outcome of the relay
//! request never reaches the caller. Failures are logged and dropped.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sends a text notification to whoever operates the shop
pub trait Notifier: Send + Sync {
    fn notify(&self, message: String);
}

/// Credentials for the Pushover relay
#[derive(Debug, Clone)]
pub struct PushoverCredentials {
    pub user: String,
    pub token: String,
}

#[derive(Clone)]
pub struct PushoverNotifier {
    client: Client,
    url: String,
    credentials: Option<PushoverCredentials>,
}

impl PushoverNotifier {
    pub fn new<U: Into<String>>(url: U, credentials: Option<PushoverCredentials>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: url.into(),
            credentials,
        })
    }

    /// Post one message to the relay and wait for the outcome
    pub async fn send(&self, message: &str) -> Result<()> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("Pushover credentials not configured"))?;

        let form = [
            ("user", credentials.user.as_str()),
            ("token", credentials.token.as_str()),
            ("message", message),
        ];
        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .context("Pushover request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Pushover responded with {}", status));
        }
        Ok(())
    }
}

impl Notifier for PushoverNotifier {
    fn notify(&self, message: String) {
        info!("Push: {}", message);
        if self.credentials.is_none() {
            info!("Pushover credentials not found - skipping notification");
            return;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                warn!("Notification dropped: {:#}", e);
            }
        });
    }
}
