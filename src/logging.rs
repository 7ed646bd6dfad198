//! Tracing initialization and log-safe formatting helpers

use crate::config::{LogFormat, LoggingConfig};
use crate::hashing::hash_sha256;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` takes precedence over `LOG_LEVEL`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

/// Mask a phone number for logs, keeping the first 4 and last 3 characters
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 7), tail)
}

/// Stable short identifier for correlating log lines about one phone number
pub fn phone_fingerprint(phone: &str) -> String {
    hash_sha256(phone)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("254712345678"), "2547*****678");
        assert_eq!(mask_phone("12345"), "*****");
        assert_eq!(mask_phone(""), "");
    }

    #[test]
    fn test_phone_fingerprint_is_stable_and_short() {
        let a = phone_fingerprint("254712345678");
        assert_eq!(a.len(), 12);
        assert_eq!(a, phone_fingerprint("254712345678"));
        assert_ne!(a, phone_fingerprint("254712345679"));
    }
}
