//! Configuration structures.
//!
//! Configuration is built from defaults and optionally overlaid with
//! environment variables.

use serde::{Deserialize, Serialize};

use super::errors::{Error, Result};

/// One kibibyte.
pub const KB: u64 = 1 << 10;
/// One mebibyte.
pub const MB: u64 = 1 << 20;

/// Default cap on inbound documents accepted by `Envelope::decode`.
pub const DEFAULT_MAX_DECODE_BYTES: u64 = 2 * MB;

/// Global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Envelope behaviour.
    #[serde(default)]
    pub envelope: EnvelopeConfig,

    /// Echo server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Defaults overlaid with `IOJSON_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("IOJSON_MAX_DECODE_BYTES") {
            config.envelope.max_decode_bytes = raw.trim().parse().map_err(|_| {
                Error::config(format!("IOJSON_MAX_DECODE_BYTES is not a byte count: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("IOJSON_DEBUG_CALLER") {
            config.envelope.debug_caller = parse_flag(&raw)
                .ok_or_else(|| Error::config(format!("IOJSON_DEBUG_CALLER is not a flag: {raw}")))?;
        }
        if let Ok(addr) = std::env::var("IOJSON_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Per-envelope settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Maximum inbound document size in bytes.
    pub max_decode_bytes: u64,

    /// Append the caller's `file:line` to every recorded error message.
    pub debug_caller: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
            debug_caller: false,
        }
    }
}

/// Echo server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.envelope.max_decode_bytes, 2 * 1024 * 1024);
        assert!(!config.envelope.debug_caller);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"envelope":{"max_decode_bytes":1024,"debug_caller":true}}"#)
                .unwrap();
        assert_eq!(config.envelope.max_decode_bytes, KB);
        assert!(config.envelope.debug_caller);
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
    }

    // The only test that touches IOJSON_* variables, so no other test races it.
    #[test]
    fn test_from_env_overlay() {
        std::env::set_var("IOJSON_MAX_DECODE_BYTES", " 4096 ");
        std::env::set_var("IOJSON_DEBUG_CALLER", "yes");
        std::env::set_var("IOJSON_LISTEN_ADDR", "0.0.0.0:9000");
        let config = Config::from_env().unwrap();
        assert_eq!(config.envelope.max_decode_bytes, 4 * KB);
        assert!(config.envelope.debug_caller);
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");

        std::env::set_var("IOJSON_MAX_DECODE_BYTES", "lots");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(&err, Error::Config(msg) if msg.contains("lots")));

        std::env::remove_var("IOJSON_MAX_DECODE_BYTES");
        std::env::set_var("IOJSON_DEBUG_CALLER", "maybe");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(&err, Error::Config(msg) if msg.contains("IOJSON_DEBUG_CALLER")));

        std::env::remove_var("IOJSON_DEBUG_CALLER");
        std::env::remove_var("IOJSON_LISTEN_ADDR");
        let config = Config::from_env().unwrap();
        assert_eq!(config.envelope, EnvelopeConfig::default());
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
