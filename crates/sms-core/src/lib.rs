//! # SMS Core
//!
//! Core traits and types shared by the smsmenu crates.
//!
//! This crate provides the building blocks the ordering webhook is wired from:
//! - [`SmsClient`] trait implemented by SMS providers
//! - [`MessagingGateway`] trait the webhook sends replies through
//! - [`InboundWebhook`] trait for decoding incoming webhooks
//! - Common types for requests, responses, and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{MessagingGateway, OutboundMessage, SenderGateway};
//!
//! // Any SmsClient becomes a gateway once it knows its sender number
//! let gateway = SenderGateway::new(client, "+15550001111");
//! let ack = gateway.send(&OutboundMessage::new("+1234567890", "Hello!")).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Errors that can occur during SMS operations
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// HTTP communication error
    #[error("http error: {0}")]
    Http(String),
    /// Authentication/authorization error
    #[error("authentication error: {0}")]
    Auth(String),
    /// Invalid request parameters (bad number, empty body, ...)
    #[error("invalid request: {0}")]
    Invalid(String),
    /// SMS provider returned an error
    #[error("provider error: {0}")]
    Provider(String),
    /// The send did not complete in time
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Unexpected error occurred
    #[error("unexpected: {0}")]
    Unexpected(String),
}

/// Web-specific error types for webhook processing
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("parsing failed: {0}")]
    ParseError(String),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "twilio".
    pub provider: &'static str,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Normalized inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub text: String,
    pub timestamp: Option<OffsetDateTime>,
    pub provider: &'static str,
    pub raw: serde_json::Value,
}

/// A reply on its way out. Not retained after the send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub to: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: body.into(),
        }
    }
}

/// Fixed body returned to the webhook caller for every accepted message.
pub const ACKNOWLEDGMENT: &str = "message received";

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    /// The acknowledgment sent back to the provider, regardless of how the reply went.
    pub fn acknowledged() -> Self {
        Self {
            status: HttpStatus::Ok,
            body: ACKNOWLEDGMENT.to_string(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
            content_type: "application/json".to_string(),
        }
    }
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Send a single text SMS.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError>;
}

/// Outbound seam used by the webhook: send `body` to `to` from a number fixed at startup.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<SendResponse, SmsError>;
}

/// Binds an [`SmsClient`] to the configured sender number.
#[derive(Debug, Clone)]
pub struct SenderGateway<C> {
    client: C,
    sender_number: String,
}

impl<C: SmsClient> SenderGateway<C> {
    pub fn new(client: C, sender_number: impl Into<String>) -> Self {
        Self {
            client,
            sender_number: sender_number.into(),
        }
    }

    pub fn sender_number(&self) -> &str {
        &self.sender_number
    }
}

#[async_trait]
impl<C: SmsClient> MessagingGateway for SenderGateway<C> {
    async fn send(&self, message: &OutboundMessage) -> Result<SendResponse, SmsError> {
        if message.body.is_empty() {
            return Err(SmsError::Invalid("empty message body".into()));
        }
        self.client
            .send(SendRequest {
                to: &message.to,
                from: &self.sender_number,
                text: &message.body,
            })
            .await
    }
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;

/// Provider-agnostic inbound webhook interface.
pub trait InboundWebhook: Send + Sync {
    /// Stable provider key, e.g. "twilio".
    fn provider(&self) -> &'static str;
    /// Parse the incoming HTTP payload (headers + raw body) into a normalized `InboundMessage`.
    fn parse_inbound(&self, headers: &Headers, body: &[u8]) -> Result<InboundMessage, SmsError>;
}
