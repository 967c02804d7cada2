//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use sequence_core::HubConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Name reported by the ping endpoint
    pub server_name: String,
    /// Idle session lifetime in seconds
    pub session_ttl_secs: u64,
    /// Inactive game threshold in seconds
    pub game_inactivity_secs: u64,
    /// Reconnect grace window in seconds
    pub disconnect_grace_secs: u64,
    /// Rematch voting window in seconds
    pub rematch_window_secs: u64,
    /// Heartbeat cadence in seconds
    pub heartbeat_secs: u64,
    /// GC cadence in seconds
    pub gc_interval_secs: u64,
    /// Minimum AI move latency in milliseconds
    pub ai_delay_min_ms: u64,
    /// Maximum AI move latency in milliseconds
    pub ai_delay_max_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables, with an optional
    /// bind override from the CLI.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:3344"
                    .parse()
                    .expect("Default bind address is valid")
            });

        Ok(Self {
            bind,
            server_name: std::env::var("SERVER_NAME")
                .unwrap_or_else(|_| "sequence-server".to_string()),
            session_ttl_secs: parse_env_or("SESSION_TTL_SECS", 24 * 60 * 60),
            game_inactivity_secs: parse_env_or("GAME_INACTIVITY_SECS", 360),
            disconnect_grace_secs: parse_env_or("DISCONNECT_GRACE_SECS", 10),
            rematch_window_secs: parse_env_or("REMATCH_WINDOW_SECS", 30),
            heartbeat_secs: parse_env_or("HEARTBEAT_SECS", 30),
            gc_interval_secs: parse_env_or("GC_INTERVAL_SECS", 60),
            ai_delay_min_ms: parse_env_or("AI_DELAY_MIN_MS", 800),
            ai_delay_max_ms: parse_env_or("AI_DELAY_MAX_MS", 1200),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "SERVER_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }
        if self.ai_delay_min_ms > self.ai_delay_max_ms {
            return Err(ConfigError::Invalid {
                var: "AI_DELAY_MIN_MS".to_string(),
                reason: format!(
                    "Must not exceed AI_DELAY_MAX_MS ({})",
                    self.ai_delay_max_ms
                ),
            });
        }
        for (var, value) in [
            ("SESSION_TTL_SECS", self.session_ttl_secs),
            ("GAME_INACTIVITY_SECS", self.game_inactivity_secs),
            ("HEARTBEAT_SECS", self.heartbeat_secs),
            ("GC_INTERVAL_SECS", self.gc_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Hub tunables derived from this configuration.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            server_name: self.server_name.clone(),
            session_ttl_secs: self.session_ttl_secs,
            game_inactivity_secs: self.game_inactivity_secs,
            disconnect_grace_secs: self.disconnect_grace_secs,
            rematch_window_secs: self.rematch_window_secs,
            heartbeat_secs: self.heartbeat_secs,
            gc_interval_secs: self.gc_interval_secs,
            ai_delay_ms: (self.ai_delay_min_ms, self.ai_delay_max_ms),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:3344".parse().unwrap(),
            server_name: "test".to_string(),
            session_ttl_secs: 86_400,
            game_inactivity_secs: 360,
            disconnect_grace_secs: 10,
            rematch_window_secs: 30,
            heartbeat_secs: 30,
            gc_interval_secs: 60,
            ai_delay_min_ms: 800,
            ai_delay_max_ms: 1200,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn inverted_ai_delay_bounds_rejected() {
        let mut config = base_config();
        config.ai_delay_min_ms = 2_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_heartbeat_rejected() {
        let mut config = base_config();
        config.heartbeat_secs = 0;
        assert!(config.validate().is_err());
    }
}
