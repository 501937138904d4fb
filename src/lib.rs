//! # SMS Menu
//!
//! An SMS ordering webhook. Customers text the Twilio number and get a reply:
//!
//! - `menu` lists every item with its id and price
//! - `no: 1,2 address: 5 Oak St` confirms items 1 and 2 with their total and the address
//! - anything else gets the list of available commands
//!
//! The webhook always answers Twilio with `message received`, whatever happened to the reply.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smsmenu::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     smsmenu::logging::init(&config.logging)?;
//!     let app = smsmenu::build_app(&config).await?;
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Settings come from `config/*.toml` files and `SMSMENU__SECTION__KEY` environment variables;
//! `TWILIO_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_NUMBER` are also honored.

pub mod config;
pub mod logging;

pub use crate::config::*;

use anyhow::Context;
use axum::Router;
use menu_store::{MenuStore, SqliteMenuStore};
use sms_core::{MessagingGateway, SenderGateway};
use sms_twilio::{TwilioClient, TwilioWebhook};
use sms_web_axum::{router, AppState};
use sms_web_generic::WebhookProcessor;
use std::sync::Arc;
use tracing::info;

/// Open the menu database and Twilio client described by `config` and wire them into the router.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    config.validate()?;

    let store = SqliteMenuStore::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("connecting to {}", config.database.url))?;
    store.migrate().await.context("creating menus table")?;
    if config.database.seed {
        store.seed_default_menu().await.context("seeding menu")?;
    }

    let twilio = &config.twilio;
    let client = TwilioClient::with_base_url(
        twilio.account_sid.clone(),
        twilio.auth_token.clone(),
        twilio.base_url.clone(),
    )
    .with_timeout(twilio.send_timeout())?;
    let gateway = SenderGateway::new(client, twilio.sender_number.clone());
    info!(sender = gateway.sender_number(), "twilio gateway ready");

    Ok(build_router(Arc::new(store), Arc::new(gateway), config))
}

/// Assemble the webhook router around an existing store and gateway.
pub fn build_router(
    store: Arc<dyn MenuStore>,
    gateway: Arc<dyn MessagingGateway>,
    config: &AppConfig,
) -> Router {
    let processor = WebhookProcessor::new(Arc::new(TwilioWebhook), store, gateway)
        .with_parse_mode(config.ordering.parse_mode)
        .with_send_timeout(config.twilio.send_timeout());
    router(AppState {
        processor: Arc::new(processor),
    })
}

/// Common imports for SMS Menu usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, DatabaseConfig, LoggingConfig, OrderingConfig, ServerConfig, TwilioConfig,
    };
    pub use menu_commands::{parse, parse_with, Command, OrderError, ParseMode};
    pub use menu_store::{InMemoryMenuStore, MenuItem, MenuStore, SqliteMenuStore, StoreError};
    pub use sms_core::*;
    pub use sms_web_generic::{Delivery, WebhookProcessor};
}
