//! Database configuration.

use std::env;

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables.
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 20)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 5)
    /// - `DB_CONNECTION_TIMEOUT_SECS`: Connection timeout in seconds (default: 5)
    /// - `DB_IDLE_TIMEOUT_SECS`: Idle timeout in seconds (default: 300)
    /// - `DB_MAX_LIFETIME_SECS`: Max lifetime in seconds (default: 1800)
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set or a pool knob is not numeric.
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("DB_MAX_CONNECTIONS must be a valid u32"),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DB_MIN_CONNECTIONS must be a valid u32"),
            connection_timeout_secs: env::var("DB_CONNECTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DB_CONNECTION_TIMEOUT_SECS must be a valid u64"),
            idle_timeout_secs: env::var("DB_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("DB_IDLE_TIMEOUT_SECS must be a valid u64"),
            max_lifetime_secs: env::var("DB_MAX_LIFETIME_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .expect("DB_MAX_LIFETIME_SECS must be a valid u64"),
        }
    }

    /// Default configuration for local development.
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/holdem_db".to_string(),
            max_connections: 10,
            min_connections: 2,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_sane() {
        let config = DatabaseConfig::development();
        assert!(config.database_url.starts_with("postgres://"));
        assert!(config.min_connections <= config.max_connections);
    }

    #[test]
    fn from_env_reads_the_secs_suffixed_knobs() {
        // SAFETY: no other test in this binary reads or writes these
        // variables.
        unsafe {
            env::set_var("DATABASE_URL", "postgres://postgres@localhost/holdem_test");
            env::set_var("DB_CONNECTION_TIMEOUT_SECS", "7");
            env::set_var("DB_IDLE_TIMEOUT_SECS", "120");
            env::set_var("DB_MAX_LIFETIME_SECS", "900");
        }

        let config = DatabaseConfig::from_env();
        assert_eq!(config.connection_timeout_secs, 7);
        assert_eq!(config.idle_timeout_secs, 120);
        assert_eq!(config.max_lifetime_secs, 900);

        unsafe {
            env::remove_var("DB_CONNECTION_TIMEOUT_SECS");
            env::remove_var("DB_IDLE_TIMEOUT_SECS");
            env::remove_var("DB_MAX_LIFETIME_SECS");
        }
    }
}
