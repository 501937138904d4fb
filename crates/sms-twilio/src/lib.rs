//! # Twilio SMS Provider
//!
//! Twilio Programmable Messaging implementation for smsmenu.
//!
//! - [`TwilioClient`] sends messages through the REST API
//! - [`TwilioInbound`] decodes the form-encoded webhook Twilio posts for incoming SMS
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{SendRequest, SmsClient};
//! use sms_twilio::TwilioClient;
//!
//! let client = TwilioClient::new("ACxxxxxxxx", "auth_token");
//! let response = client.send(SendRequest {
//!     to: "+1234567890",
//!     from: "+0987654321",
//!     text: "Hello from Twilio!"
//! }).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sms_core::{Headers, InboundMessage, InboundWebhook, SendRequest, SendResponse, SmsClient, SmsError};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const PROVIDER: &str = "twilio";
const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Twilio REST client.
#[derive(Clone, Debug)]
pub struct TwilioClient {
    /// Twilio Account SID.
    pub account_sid: String,
    /// Twilio Auth Token (password for Basic auth).
    pub auth_token: String,
    /// API base URL; override for testing/mocking.
    pub base_url: String,
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new<S: Into<String>>(account_sid: S, auth_token: S) -> Self {
        Self::with_base_url(account_sid, auth_token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url<S: Into<String>>(account_sid: S, auth_token: S, base_url: String) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Bound every request made by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SmsError> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SmsError::Unexpected(format!("http client: {}", e)))?;
        Ok(self)
    }

    fn messages_url(&self) -> Result<Url, SmsError> {
        let raw = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        );
        Url::parse(&raw).map_err(|e| SmsError::Invalid(format!("base url {}: {}", raw, e)))
    }
}

#[derive(Debug, Serialize)]
struct TwilioSendRequest<'a> {
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "Body")]
    body: &'a str,
}

/// Error document Twilio returns alongside 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    code: Option<u32>,
    message: String,
}

fn error_for_status(status: reqwest::StatusCode, body: &str) -> SmsError {
    let detail = match serde_json::from_str::<TwilioErrorResponse>(body) {
        Ok(err) => match err.code {
            Some(code) => format!("{} (code {})", err.message, code),
            None => err.message,
        },
        Err(_) => body.to_string(),
    };
    match status.as_u16() {
        401 | 403 => SmsError::Auth(detail),
        400 => SmsError::Invalid(detail),
        _ => SmsError::Provider(format!("HTTP {}: {}", status, detail)),
    }
}

#[async_trait]
impl SmsClient for TwilioClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        let url = self.messages_url()?;
        let payload = TwilioSendRequest {
            to: req.to,
            from: req.from,
            body: req.text,
        };
        debug!(to = req.to, from = req.from, "sending sms via twilio");

        let res = self
            .http
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await
            .map_err(|e| SmsError::Http(e.to_string()))?;

        let status = res.status();
        let raw_text = res
            .text()
            .await
            .map_err(|e| SmsError::Http(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, to = req.to, "twilio rejected message");
            return Err(error_for_status(status, &raw_text));
        }

        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));

        let id = raw_json
            .get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(sms_core::fallback_id);

        Ok(SendResponse {
            id,
            provider: PROVIDER,
            raw: raw_json,
        })
    }
}

/// Fields of the inbound SMS webhook this crate cares about.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TwilioInbound {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
    #[serde(rename = "AccountSid")]
    pub account_sid: Option<String>,
}

impl TwilioInbound {
    fn into_message(self, raw: serde_json::Value) -> InboundMessage {
        InboundMessage {
            id: self.message_sid,
            from: self.from,
            to: self.to,
            text: self.body,
            // Twilio does not send a timestamp with inbound SMS.
            timestamp: None,
            provider: PROVIDER,
            raw,
        }
    }
}

/// Decodes Twilio's inbound SMS webhook.
#[derive(Clone, Debug, Default)]
pub struct TwilioWebhook;

impl InboundWebhook for TwilioWebhook {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn parse_inbound(&self, _headers: &Headers, body: &[u8]) -> Result<InboundMessage, SmsError> {
        // Twilio always posts application/x-www-form-urlencoded.
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| SmsError::Invalid(format!("form decode: {}", e)))?;
        let inbound: TwilioInbound = serde_urlencoded::from_bytes(body)
            .map_err(|e| SmsError::Invalid(format!("form decode: {}", e)))?;

        if inbound.from.trim().is_empty() {
            return Err(SmsError::Invalid("empty From".into()));
        }

        let raw = serde_json::Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
        );
        Ok(inbound.into_message(raw))
    }
}
