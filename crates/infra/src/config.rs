//! Process configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `JWT_SECRET` | `dev-secret` (logged as insecure) |
//! | `TOKEN_TTL_HOURS` | `24` (at most `8760`) |
//! | `BCRYPT_COST` | `10` |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub database: Option<DatabaseConfig>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("database", &self.database)
            .finish()
    }
}

impl AppConfig {
    /// Defaults with the given signing secret and no database (in-memory store).
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: default_bind_addr(),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            database: None,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr: SocketAddr = parse_or(&get, "BIND_ADDR", default_bind_addr())?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let ttl_hours: i64 = parse_or(&get, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours <= 0 {
            return Err(invalid("TOKEN_TTL_HOURS", ttl_hours.to_string(), "must be positive"));
        }
        if ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(invalid(
                "TOKEN_TTL_HOURS",
                ttl_hours.to_string(),
                format!("must be at most {MAX_TOKEN_TTL_HOURS}"),
            ));
        }

        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", bcrypt_cost.to_string(), "must be within 4..=31"));
        }

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            }),
            None => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            bcrypt_cost,
            database,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(var, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn invalid(var: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, Duration::hours(24));
        assert_eq!(cfg.bcrypt_cost, 10);
        assert!(cfg.database.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = load(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("JWT_SECRET", "s3cr3t"),
            ("TOKEN_TTL_HOURS", "2"),
            ("BCRYPT_COST", "4"),
            ("DATABASE_URL", "postgres://localhost/eventdesk"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.jwt_secret, "s3cr3t");
        assert_eq!(cfg.token_ttl, Duration::hours(2));
        assert_eq!(cfg.bcrypt_cost, 4);
        let db = cfg.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/eventdesk");
        assert_eq!(db.max_connections, 12);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = load(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")]).unwrap();
        assert!(cfg.database.is_none());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn malformed_values_are_reported_with_the_variable_name() {
        let err = load(&[("BCRYPT_COST", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BCRYPT_COST", .. }));

        let err = load(&[("BCRYPT_COST", "2")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BCRYPT_COST", .. }));

        let err = load(&[("TOKEN_TTL_HOURS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TOKEN_TTL_HOURS", .. }));
    }

    #[test]
    fn token_ttl_is_capped_at_one_year() {
        let cfg = load(&[("TOKEN_TTL_HOURS", "8760")]).unwrap();
        assert_eq!(cfg.token_ttl, Duration::hours(MAX_TOKEN_TTL_HOURS));

        let err = load(&[("TOKEN_TTL_HOURS", "10000000000")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS",
                value: "10000000000".to_string(),
                reason: "must be at most 8760".to_string(),
            }
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = load(&[("JWT_SECRET", "very-secret"), ("DATABASE_URL", "postgres://u:pw@h/db")]).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(!dbg.contains("pw@h"));
    }
}
