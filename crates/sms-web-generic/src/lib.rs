use menu_commands::{
    format_help, format_invalid_order, format_menu, format_order_confirmation,
    format_store_unavailable, parse_with, Command, ParseMode,
};
use menu_store::MenuStore;
use sms_core::{
    Headers, HttpStatus, InboundMessage, InboundWebhook, MessagingGateway, OutboundMessage,
    SendResponse, SmsError, WebhookError, WebhookResponse,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to the reply. Never changes the webhook acknowledgment.
#[derive(Debug)]
pub enum Delivery {
    Sent(SendResponse),
    Failed(SmsError),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent(_))
    }
}

/// Framework-agnostic webhook processor: decode, parse, look up, format, reply, acknowledge.
#[derive(Clone)]
pub struct WebhookProcessor {
    inbound: Arc<dyn InboundWebhook>,
    store: Arc<dyn MenuStore>,
    gateway: Arc<dyn MessagingGateway>,
    parse_mode: ParseMode,
    send_timeout: Duration,
}

impl WebhookProcessor {
    pub fn new(
        inbound: Arc<dyn InboundWebhook>,
        store: Arc<dyn MenuStore>,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            inbound,
            store,
            gateway,
            parse_mode: ParseMode::default(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Process an incoming webhook request and return a framework-agnostic response.
    ///
    /// Any decodable message is acknowledged with 200, whatever happens to the reply.
    pub async fn process_webhook(&self, headers: Headers, body: &[u8]) -> WebhookResponse {
        match self.decode(&headers, body) {
            Ok(message) => {
                self.handle(&message).await;
                WebhookResponse::acknowledged()
            }
            Err(e) => self.error_to_response(e),
        }
    }

    fn decode(&self, headers: &Headers, body: &[u8]) -> Result<InboundMessage, WebhookError> {
        self.inbound
            .parse_inbound(headers, body)
            .map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn error_to_response(&self, error: WebhookError) -> WebhookResponse {
        match error {
            WebhookError::ParseError(msg) => {
                warn!(provider = self.inbound.provider(), error = %msg, "rejected webhook");
                WebhookResponse::error(HttpStatus::BadRequest, &format!("parse error: {}", msg))
            }
        }
    }

    /// Answer one inbound message.
    pub async fn handle(&self, message: &InboundMessage) -> Delivery {
        let command = parse_with(&message.text, self.parse_mode);
        info!(from = %message.from, command = command.name(), "received sms");

        let body = self.reply_for(&command).await;
        self.deliver(OutboundMessage::new(message.from.clone(), body)).await
    }

    /// Reply text for `command`. A store failure turns into an apology, not an error.
    pub async fn reply_for(&self, command: &Command) -> String {
        match command {
            Command::ShowMenu => match self.store.list_all().await {
                Ok(items) => format_menu(&items),
                Err(e) => {
                    error!(error = %e, "could not list menu");
                    format_store_unavailable()
                }
            },
            Command::PlaceOrder { item_ids, address } => {
                match self.store.find_by_ids(item_ids).await {
                    Ok(items) => {
                        if items.len() < item_ids.len() {
                            debug!(requested = ?item_ids, found = items.len(), "some items not on the menu");
                        }
                        format_order_confirmation(&items, address).unwrap_or_else(|| {
                            error!(requested = ?item_ids, "order total overflowed");
                            format_store_unavailable()
                        })
                    }
                    Err(e) => {
                        error!(error = %e, "could not look up ordered items");
                        format_store_unavailable()
                    }
                }
            }
            Command::InvalidOrder { raw_body, error } => {
                debug!(body = %raw_body, %error, "malformed order");
                format_invalid_order(error)
            }
            Command::Unknown { .. } => format_help(),
        }
    }

    async fn deliver(&self, outbound: OutboundMessage) -> Delivery {
        let sent = tokio::time::timeout(self.send_timeout, self.gateway.send(&outbound))
            .await
            .unwrap_or_else(|_| Err(SmsError::Timeout(self.send_timeout)));

        match sent {
            Ok(response) => {
                debug!(to = %outbound.to, id = %response.id, "reply sent");
                Delivery::Sent(response)
            }
            Err(e) => {
                warn!(to = %outbound.to, error = %e, "reply not delivered");
                Delivery::Failed(e)
            }
        }
    }
}

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use menu_store::{InMemoryMenuStore, MenuItem, StoreError};
    use sms_twilio::TwilioWebhook;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<OutboundMessage>>,
        fail: bool,
    }

    impl RecordingGateway {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingGateway for RecordingGateway {
        async fn send(&self, message: &OutboundMessage) -> Result<SendResponse, SmsError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(SmsError::Auth("bad credentials".into()));
            }
            Ok(SendResponse {
                id: "SM1".into(),
                provider: "recording",
                raw: serde_json::Value::Null,
            })
        }
    }

    struct SlowGateway;

    #[async_trait]
    impl MessagingGateway for SlowGateway {
        async fn send(&self, _message: &OutboundMessage) -> Result<SendResponse, SmsError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(SmsError::Unexpected("should have timed out".into()))
        }
    }

    struct DownStore;

    #[async_trait]
    impl MenuStore for DownStore {
        async fn list_all(&self) -> Result<Vec<MenuItem>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_ids(&self, _ids: &[i64]) -> Result<Vec<MenuItem>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn processor(store: Arc<dyn MenuStore>, gateway: Arc<dyn MessagingGateway>) -> WebhookProcessor {
        WebhookProcessor::new(Arc::new(TwilioWebhook), store, gateway)
    }

    fn default_store() -> Arc<dyn MenuStore> {
        Arc::new(InMemoryMenuStore::with_default_menu())
    }

    fn inbound(from: &str, text: &str) -> InboundMessage {
        InboundMessage {
            id: None,
            from: from.to_string(),
            to: String::new(),
            text: text.to_string(),
            timestamp: None,
            provider: "twilio",
            raw: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn menu_request_gets_menu() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        let delivery = processor.handle(&inbound("+1555", "Menu")).await;
        assert!(delivery.is_sent());

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+1555");
        assert!(sent[0].body.starts_with("1. Nigerian Jollof Rice and Chicken | $100"));
        assert!(sent[0].body.contains("4. Ghana Jollof Rice and Water | $5"));
    }

    #[tokio::test]
    async fn order_gets_confirmation() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        processor
            .handle(&inbound("+1555", "no: 1,4 address: Lagos"))
            .await;

        let body = &gateway.sent()[0].body;
        assert!(body.contains("1. Nigerian Jollof Rice and Chicken | $100"));
        assert!(body.contains("4. Ghana Jollof Rice and Water | $5"));
        assert!(!body.contains("Burger and Coke"));
        assert!(body.contains("Total: $105"));
        assert!(body.ends_with("Address: Lagos"));
    }

    #[tokio::test]
    async fn unknown_ids_are_left_out_of_total() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        processor
            .handle(&inbound("+1555", "no: 2,99 address: ikeja"))
            .await;

        let body = &gateway.sent()[0].body;
        assert!(body.contains("Total: $50"));
        assert!(body.ends_with("Address: Ikeja"));
    }

    #[tokio::test]
    async fn unknown_command_gets_help() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        processor.handle(&inbound("+1555", "hello?")).await;
        assert_eq!(
            gateway.sent()[0].body,
            "Invalid command sent.\n\nAvailable commands:\n1. menu"
        );
    }

    #[tokio::test]
    async fn malformed_order_gets_explanation() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        processor.handle(&inbound("+1555", "no: 1,2")).await;
        let body = &gateway.sent()[0].body;
        assert!(body.starts_with("Sorry, we could not read your order"));
        assert!(body.contains("address:"));
    }

    #[tokio::test]
    async fn permissive_mode_accepts_loose_orders() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor =
            processor(default_store(), gateway.clone()).with_parse_mode(ParseMode::Permissive);

        processor
            .handle(&inbound("+1555", "no: 1 x 3 address lekki"))
            .await;
        let body = &gateway.sent()[0].body;
        assert!(body.contains("Total: $130"));
        assert!(body.ends_with("Address: Lekki"));
    }

    #[tokio::test]
    async fn store_outage_sends_apology() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(Arc::new(DownStore), gateway.clone());

        processor.handle(&inbound("+1555", "menu")).await;
        processor
            .handle(&inbound("+1555", "no: 1 address: Lagos"))
            .await;

        let sent = gateway.sent();
        assert_eq!(sent.len(), 2);
        for message in sent {
            assert_eq!(
                message.body,
                "Sorry, our menu is unavailable right now. Please try again later."
            );
        }
    }

    #[tokio::test]
    async fn overflowing_total_sends_apology() {
        use rust_decimal::Decimal;

        let store = InMemoryMenuStore::new(vec![
            MenuItem {
                id: 1,
                name: "Gold plate".into(),
                price: Decimal::MAX,
            },
            MenuItem {
                id: 2,
                name: "Silver plate".into(),
                price: Decimal::MAX,
            },
        ]);
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(Arc::new(store), gateway.clone());

        let response = processor
            .process_webhook(vec![], b"From=%2B1555&Body=no%3A+1%2C2+address%3A+Lagos")
            .await;

        assert_eq!(response.status.as_u16(), 200);
        assert_eq!(
            gateway.sent()[0].body,
            "Sorry, our menu is unavailable right now. Please try again later."
        );
    }

    #[tokio::test]
    async fn gateway_failure_is_reported_not_raised() {
        let gateway = Arc::new(RecordingGateway::failing());
        let processor = processor(default_store(), gateway.clone());

        let delivery = processor.handle(&inbound("+1555", "menu")).await;
        assert!(matches!(delivery, Delivery::Failed(SmsError::Auth(_))));
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let processor = processor(default_store(), Arc::new(SlowGateway))
            .with_send_timeout(Duration::from_millis(50));

        let delivery = processor.handle(&inbound("+1555", "menu")).await;
        assert!(matches!(delivery, Delivery::Failed(SmsError::Timeout(_))));
    }

    #[tokio::test]
    async fn webhook_always_acknowledges() {
        for gateway in [
            Arc::new(RecordingGateway::default()),
            Arc::new(RecordingGateway::failing()),
        ] {
            let processor = processor(default_store(), gateway.clone());
            let response = processor
                .process_webhook(vec![], b"From=%2B1555&Body=no%3A+1%2C4+address%3A+Lagos")
                .await;

            assert_eq!(response.status.as_u16(), 200);
            assert_eq!(response.body, "message received");
            assert_eq!(gateway.sent().len(), 1);
        }
    }

    #[tokio::test]
    async fn undecodable_webhook_is_bad_request() {
        let gateway = Arc::new(RecordingGateway::default());
        let processor = processor(default_store(), gateway.clone());

        let response = processor.process_webhook(vec![], b"Body=menu").await;
        assert_eq!(response.status.as_u16(), 400);
        assert!(response.body.contains("parse error"));
        assert!(gateway.sent().is_empty());
    }
}
