//! WhatsApp delivery through a Cloud-API-compatible HTTP gateway.
//!
//! Each message is a `POST {api_url}/{sender_id}/messages` with a bearer
//! token. Network errors and 5xx responses are retried with a short backoff;
//! 4xx responses are returned immediately.

use std::time::Duration;

use async_trait::async_trait;
use schoolhub_core::phone::to_whatsapp_number;
use serde::Serialize;

use super::ChatTransport;
use crate::error::DeliveryError;

/// Backoff between attempts. One initial attempt plus one per entry.
const RETRY_DELAYS_MS: [u64; 2] = [500, 1500];

/// HTTP request timeout for a single attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default country calling code used to internationalise local numbers.
const DEFAULT_COUNTRY_CODE: &str = "62";

/// Configuration for the WhatsApp gateway.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Base URL, e.g. `https://graph.facebook.com/v19.0`.
    pub api_url: String,
    pub api_token: String,
    /// Phone-number id of the sending account.
    pub sender_id: String,
    /// Replaces a leading `0` in local numbers.
    pub country_code: String,
}

impl WhatsAppConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `WHATSAPP_API_URL`, `WHATSAPP_API_TOKEN` and
    /// `WHATSAPP_SENDER_ID` are all set.
    ///
    /// | Variable                | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `WHATSAPP_API_URL`      | yes      | --      |
    /// | `WHATSAPP_API_TOKEN`    | yes      | --      |
    /// | `WHATSAPP_SENDER_ID`    | yes      | --      |
    /// | `WHATSAPP_COUNTRY_CODE` | no       | `62`    |
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            api_url: var("WHATSAPP_API_URL")?,
            api_token: var("WHATSAPP_API_TOKEN")?,
            sender_id: var("WHATSAPP_SENDER_ID")?,
            country_code: var("WHATSAPP_COUNTRY_CODE")
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.api_url.trim_end_matches('/'),
            self.sender_id
        )
    }
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

/// Request payload of a text message.
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    messaging_product: &'static str,
    to: String,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

impl<'a> TextMessage<'a> {
    fn new(to: String, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        }
    }
}

/// Sends text messages through the WhatsApp gateway.
pub struct WhatsAppTransport {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppTransport {
    pub fn new(config: WhatsAppConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &TextMessage<'_>) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.config.messages_url())
            .bearer_auth(&self.config.api_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

/// `true` if another attempt may succeed.
fn is_retryable(err: &DeliveryError) -> bool {
    match err {
        DeliveryError::Request(_) => true,
        DeliveryError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

#[async_trait]
impl ChatTransport for WhatsAppTransport {
    async fn send_text(&self, telephone: &str, body: &str) -> Result<(), DeliveryError> {
        let to = to_whatsapp_number(telephone, &self.config.country_code);
        let payload = TextMessage::new(to, body);

        let mut result = self.try_send(&payload).await;
        for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
            match &result {
                Err(e) if is_retryable(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        to = %payload.to,
                        error = %e,
                        "WhatsApp send failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    result = self.try_send(&payload).await;
                }
                _ => break,
            }
        }

        match &result {
            Ok(()) => tracing::info!(to = %payload.to, "WhatsApp message sent"),
            Err(e) => tracing::error!(to = %payload.to, error = %e, "WhatsApp send failed"),
        }
        result
    }
}
