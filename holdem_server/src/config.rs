//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use holdem_core::db::DatabaseConfig;
use holdem_core::session::SeatConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Participants seated when a game starts
    pub seats: Vec<SeatConfig>,
    /// Default seconds between blind-level escalations
    pub blind_interval_secs: i64,
    /// Default small blind wager
    pub small_blind: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:7878"
                    .parse()
                    .expect("Default bind address is valid")
            });

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "postgres://postgres@localhost/holdem_db".to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        let seats = match std::env::var("SEED_PARTICIPANTS") {
            Ok(raw) => parse_seats(&raw)?,
            Err(_) => default_seats(),
        };

        Ok(ServerConfig {
            bind,
            database,
            seats,
            blind_interval_secs: parse_env_or("BLIND_INTERVAL_SECS", 600),
            small_blind: parse_env_or("SMALL_BLIND", 10),
        })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seats.len() < 3 {
            return Err(ConfigError::Invalid {
                var: "SEED_PARTICIPANTS".to_string(),
                reason: "A game needs at least 3 participants".to_string(),
            });
        }

        if self.small_blind <= 0 {
            return Err(ConfigError::Invalid {
                var: "SMALL_BLIND".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.blind_interval_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "BLIND_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        for seat in &self.seats {
            if seat.stack < self.small_blind * 2 {
                return Err(ConfigError::Invalid {
                    var: "SEED_PARTICIPANTS".to_string(),
                    reason: format!(
                        "Seat '{}' cannot cover the big blind ({})",
                        seat.name,
                        self.small_blind * 2
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse `SEED_PARTICIPANTS`: comma-separated `name:stack` pairs,
/// e.g. `Alice:1000,Bob:1500`.
fn parse_seats(raw: &str) -> Result<Vec<SeatConfig>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, stack) = entry.split_once(':').ok_or_else(|| ConfigError::Invalid {
                var: "SEED_PARTICIPANTS".to_string(),
                reason: format!("Expected name:stack, got '{entry}'"),
            })?;
            let stack = stack.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "SEED_PARTICIPANTS".to_string(),
                reason: format!("Stack for '{name}' is not a number"),
            })?;
            Ok(SeatConfig {
                name: name.trim().to_string(),
                stack,
            })
        })
        .collect()
}

fn default_seats() -> Vec<SeatConfig> {
    (1..=4)
        .map(|i| SeatConfig {
            name: format!("Player {i}"),
            stack: 1000,
        })
        .collect()
}

/// Helper to parse environment variable with default fallback.
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
            bind: "127.0.0.1:7878".parse().unwrap(),
            database: DatabaseConfig::development(),
            seats: default_seats(),
            blind_interval_secs: 600,
            small_blind: 10,
        }
    }

    #[test]
    fn seats_parse_from_name_stack_pairs() {
        let seats = parse_seats("Alice:1000, Bob:1500 ,Carol:800").unwrap();
        assert_eq!(seats.len(), 3);
        assert_eq!(seats[0].name, "Alice");
        assert_eq!(seats[1].stack, 1500);
        assert_eq!(seats[2].name, "Carol");
    }

    #[test]
    fn malformed_seat_entries_are_rejected() {
        assert!(matches!(
            parse_seats("Alice"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            parse_seats("Alice:lots"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn validation_requires_three_seats() {
        let mut config = base_config();
        config.seats.truncate(2);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SEED_PARTICIPANTS"));
    }

    #[test]
    fn validation_rejects_nonpositive_blinds() {
        let mut config = base_config();
        config.small_blind = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.blind_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_stacks_shorter_than_the_big_blind() {
        let mut config = base_config();
        config.seats[1].stack = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_seats_pass_validation() {
        base_config().validate().unwrap();
    }
}
