use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use menu_commands::ParseMode;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Menu database configuration
    pub database: DatabaseConfig,
    /// Twilio credentials and sender number
    pub twilio: TwilioConfig,
    /// Command parsing configuration
    pub ordering: OrderingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

/// Menu database configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL (default: sqlite://menu.db?mode=rwc)
    pub url: String,
    /// Pool size (default: 5)
    pub max_connections: u32,
    /// Insert the default menu into an empty table at startup (default: true)
    pub seed: bool,
}

/// Twilio provider configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID (required)
    pub account_sid: String,
    /// Twilio Auth Token (required)
    pub auth_token: String,
    /// Number replies are sent from (required)
    pub sender_number: String,
    /// REST API base URL (default: https://api.twilio.com)
    pub base_url: String,
    /// Upper bound on one outbound send in seconds (default: 10)
    pub send_timeout_seconds: u64,
}

/// Command parsing configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OrderingConfig {
    /// strict or permissive (default: strict)
    pub parse_mode: ParseMode,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://menu.db?mode=rwc".to_string(),
            max_connections: 5,
            seed: true,
        }
    }
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            sender_number: String::new(),
            base_url: "https://api.twilio.com".to_string(),
            send_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl TwilioConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("account_sid", &self.account_sid),
            ("auth_token", &self.auth_token),
            ("sender_number", &self.sender_number),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Message(format!(
                "missing twilio settings: {}",
                missing.join(", ")
            )));
        }
        if self.send_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "twilio.send_timeout_seconds must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables, failing if Twilio is not configured
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSMENU__)
            .add_source(Environment::with_prefix("SMSMENU").separator("__"))
            // Variable names used by existing deployments
            .set_override_option("twilio.account_sid", env::var("TWILIO_SID").ok())?
            .set_override_option("twilio.auth_token", env::var("TWILIO_AUTH_TOKEN").ok())?
            .set_override_option("twilio.sender_number", env::var("TWILIO_NUMBER").ok())?;

        Self::from_builder(builder)
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.twilio.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            twilio: TwilioConfig::default(),
            ordering: OrderingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
