// ABOUTME: Server configuration read from the environment
// ABOUTME: Bind address, CORS origin, database location, session lifetime and admin seeding

use std::env;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::path::PathBuf;

use bookshare_core::constants::database_file;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
const DEFAULT_ADMIN_STUDENT_ID: &str = "admin";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid session lifetime '{0}': must be a whole number of hours, at least 1")]
    InvalidSessionTtl(String),
}

/// Account created on first start when the database has no admin
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSeed {
    pub student_id: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
    pub db_path: PathBuf,
    pub session_ttl_hours: i64,
    /// `None` unless `BOOKSHARE_ADMIN_PASSWORD` is set
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host_str = var("BOOKSHARE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_str
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let port = var("PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .trim()
            .parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin = var("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let db_path = var("BOOKSHARE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(database_file);

        let session_ttl_hours = match var("SESSION_TTL_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if hours >= 1 => hours,
                _ => return Err(ConfigError::InvalidSessionTtl(raw)),
            },
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        let admin_seed = var("BOOKSHARE_ADMIN_PASSWORD").map(|password| AdminSeed {
            student_id: var("BOOKSHARE_ADMIN_STUDENT_ID")
                .unwrap_or_else(|| DEFAULT_ADMIN_STUDENT_ID.to_string()),
            name: var("BOOKSHARE_ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            password,
        });

        Ok(Config {
            host,
            port,
            cors_origin,
            db_path,
            session_ttl_hours,
            admin_seed,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.session_ttl_hours, 168);
        assert!(config.db_path.ends_with(".bookshare/bookshare.db"));
        assert_eq!(config.admin_seed, None);
    }

    #[test]
    fn test_custom_values() {
        let config = config_from(&[
            ("BOOKSHARE_HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("CORS_ORIGIN", "https://library.example.com"),
            ("BOOKSHARE_DB_PATH", "/tmp/library.db"),
            ("SESSION_TTL_HOURS", "12"),
        ])
        .unwrap();

        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "https://library.example.com");
        assert_eq!(config.db_path, PathBuf::from("/tmp/library.db"));
        assert_eq!(config.session_ttl(), chrono::Duration::hours(12));
    }

    #[test]
    fn test_invalid_port() {
        let result = config_from(&[("PORT", "not-a-number")]);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidPort(_)));
    }

    #[test]
    fn test_port_zero() {
        let result = config_from(&[("PORT", "0")]);
        assert!(matches!(result.unwrap_err(), ConfigError::PortOutOfRange(0)));
    }

    #[test]
    fn test_invalid_host() {
        let result = config_from(&[("BOOKSHARE_HOST", "localhost:80")]);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidHost(_)));
    }

    #[test]
    fn test_session_ttl_must_be_positive() {
        for raw in ["0", "-3", "soon"] {
            let result = config_from(&[("SESSION_TTL_HOURS", raw)]);
            assert!(matches!(result.unwrap_err(), ConfigError::InvalidSessionTtl(_)));
        }
    }

    #[test]
    fn test_admin_seed_requires_password() {
        let config = config_from(&[("BOOKSHARE_ADMIN_STUDENT_ID", "root")]).unwrap();
        assert_eq!(config.admin_seed, None);

        let config = config_from(&[
            ("BOOKSHARE_ADMIN_STUDENT_ID", "root"),
            ("BOOKSHARE_ADMIN_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert_eq!(
            config.admin_seed,
            Some(AdminSeed {
                student_id: "root".to_string(),
                name: "Administrator".to_string(),
                password: "s3cret".to_string(),
            })
        );
    }
}
