//! Application configuration, read from environment variables

use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub mpesa: MpesaSettings,
    pub messaging: MessagingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,   // seconds
    pub idle_timeout: Option<u64>, // seconds
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// M-Pesa Daraja settings.
///
/// Credentials stay optional at load time: the service must still boot without
/// them, and the token provider reports their absence when it is first used.
#[derive(Debug, Clone)]
pub struct MpesaSettings {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub shortcode: Option<String>,
    pub passkey: Option<String>,
    pub confirmation_url: Option<String>,
    pub validation_url: Option<String>,
    pub base_url: String,
    pub request_timeout: u64, // seconds
}

/// Which channel carries the feedback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingProvider {
    WhatsApp,
    Twilio,
    Disabled,
}

/// Outbound messaging configuration
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub provider: MessagingProvider,
    pub whatsapp_token: Option<String>,
    pub whatsapp_api_url: String,
    pub whatsapp_phone_number_id: String,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_number: Option<String>,
    pub twilio_api_url: String,
    pub timeout: u64, // seconds
}

/// Variables the service needs for full functionality. Their absence is
/// reported at startup but does not stop the server.
pub const REQUIRED_VARIABLES: [&str; 5] = [
    "MPESA_CONSUMER_KEY",
    "MPESA_CONSUMER_SECRET",
    "MPESA_SHORTCODE",
    "CONFIRMATION_URL",
    "WHATSAPP_API_TOKEN",
];

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    non_empty_var(name).unwrap_or_else(|| default.to_string())
}

/// Parse `name` when set, otherwise use `default`
fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Parse `name` when set; unset stays `None`
fn parsed_optional_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    non_empty_var(name)
        .map(|raw| {
            raw.parse()
                .map_err(|_| ConfigError::InvalidValue(name.to_string()))
        })
        .transpose()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` first when present
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            mpesa: MpesaSettings::from_env()?,
            messaging: MessagingConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.mpesa.validate()?;
        self.messaging.validate()
    }

    /// Names of required variables that are not set
    pub fn missing_required_variables(&self) -> Vec<&'static str> {
        let present = [
            self.mpesa.consumer_key.is_some(),
            self.mpesa.consumer_secret.is_some(),
            self.mpesa.shortcode.is_some(),
            self.mpesa.confirmation_url.is_some(),
            self.messaging.whatsapp_token.is_some(),
        ];

        REQUIRED_VARIABLES
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parsed_var("SERVER_PORT", 8000)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("SERVER_PORT cannot be 0".to_string()));
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("SERVER_HOST cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = non_empty_var("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVariable("DATABASE_URL".to_string()))?;

        Ok(DatabaseConfig {
            url,
            max_connections: parsed_var("DB_MAX_CONNECTIONS", 10)?,
            min_connections: parsed_var("DB_MIN_CONNECTIONS", 1)?,
            connection_timeout: parsed_var("DB_CONNECTION_TIMEOUT", 30)?,
            idle_timeout: parsed_optional_var("DB_IDLE_TIMEOUT")?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let format = match var_or("LOG_FORMAT", "plain").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        Ok(LoggingConfig {
            level: var_or("LOG_LEVEL", "INFO"),
            format,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if LEVELS.contains(&self.level.to_uppercase().as_str()) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()))
        }
    }
}

impl MpesaSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(MpesaSettings {
            consumer_key: non_empty_var("MPESA_CONSUMER_KEY"),
            consumer_secret: non_empty_var("MPESA_CONSUMER_SECRET"),
            shortcode: non_empty_var("MPESA_SHORTCODE"),
            passkey: non_empty_var("MPESA_PASSKEY"),
            confirmation_url: non_empty_var("CONFIRMATION_URL"),
            validation_url: non_empty_var("VALIDATION_URL"),
            base_url: var_or("MPESA_BASE_URL", "https://api.safaricom.co.ke"),
            request_timeout: parsed_var("MPESA_REQUEST_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.base_url) {
            return Err(ConfigError::InvalidValue(
                "MPESA_BASE_URL must be a valid URL".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "MPESA_REQUEST_TIMEOUT_SECS".to_string(),
            ));
        }
        Ok(())
    }
}

impl MessagingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match var_or("MESSAGING_PROVIDER", "whatsapp").to_lowercase().as_str() {
            "whatsapp" => MessagingProvider::WhatsApp,
            "twilio" => MessagingProvider::Twilio,
            "disabled" | "none" => MessagingProvider::Disabled,
            _ => return Err(ConfigError::InvalidValue("MESSAGING_PROVIDER".to_string())),
        };

        Ok(MessagingConfig {
            provider,
            whatsapp_token: non_empty_var("WHATSAPP_API_TOKEN"),
            whatsapp_api_url: var_or("WHATSAPP_API_URL", "https://graph.facebook.com/v16.0"),
            whatsapp_phone_number_id: var_or("WHATSAPP_PHONE_NUMBER_ID", "482516058280077"),
            twilio_account_sid: non_empty_var("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: non_empty_var("TWILIO_AUTH_TOKEN"),
            twilio_whatsapp_number: non_empty_var("TWILIO_WHATSAPP_NUMBER"),
            twilio_api_url: var_or("TWILIO_API_URL", "https://api.twilio.com"),
            timeout: parsed_var("MESSAGING_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.whatsapp_api_url) || !is_http_url(&self.twilio_api_url) {
            return Err(ConfigError::InvalidValue(
                "messaging API URLs must be http(s)".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue("MESSAGING_TIMEOUT_SECS".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}
