//! Process configuration from environment variables (optionally via `.env`)

use crate::state::participant::ProvisionEntry;
use crate::types::Role;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_DATA_FILE: &str = "bingo-data.json";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("BINGO_BIND '{0}' is not a socket address")]
    InvalidBind(String),

    #[error("BINGO_USERS entry '{entry}': {reason}")]
    InvalidUser { entry: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub data_file: PathBuf,
    pub admin_password: String,
    /// Participants to create or update at startup
    pub users: Vec<ProvisionEntry>,
    pub cors_permissive: bool,
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_raw = env_non_empty("BINGO_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        let data_file = env_non_empty("BINGO_DATA_FILE")
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
            .into();

        let admin_password = match env_non_empty("BINGO_ADMIN_PASSWORD") {
            Some(password) => password,
            None => {
                tracing::warn!("BINGO_ADMIN_PASSWORD not set, default admin password is in use");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        let users = match env_non_empty("BINGO_USERS") {
            Some(raw) => parse_users(&raw)?,
            None => Vec::new(),
        };

        let cors_permissive = std::env::var("BINGO_CORS_PERMISSIVE")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            bind,
            data_file,
            admin_password,
            users,
            cors_permissive,
        })
    }
}

/// Parse `name:secret[:role]` entries separated by commas
pub fn parse_users(raw: &str) -> Result<Vec<ProvisionEntry>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = |reason: &str| ConfigError::InvalidUser {
                entry: entry.split(':').next().unwrap_or_default().to_string(),
                reason: reason.to_string(),
            };

            let mut parts = entry.splitn(3, ':');
            let username = parts.next().unwrap_or_default().trim();
            let password = parts.next().unwrap_or_default();
            let role = match parts.next() {
                Some(role) => role.parse::<Role>().map_err(|e| invalid(&e))?,
                None => Role::Player,
            };

            if username.is_empty() {
                return Err(invalid("missing name"));
            }
            if password.is_empty() {
                return Err(invalid("missing secret"));
            }

            Ok(ProvisionEntry {
                username: username.to_string(),
                password: password.to_string(),
                role,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "BINGO_BIND",
            "BINGO_DATA_FILE",
            "BINGO_ADMIN_PASSWORD",
            "BINGO_USERS",
            "BINGO_CORS_PERMISSIVE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_parse_users() {
        let users = parse_users("alice:pw1, bob:pw2:admin ,,").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].role, Role::Player);
        assert_eq!(users[1].password, "pw2");
        assert_eq!(users[1].role, Role::Admin);
    }

    #[test]
    fn test_parse_users_rejects_bad_entries() {
        assert!(matches!(
            parse_users("alice").unwrap_err(),
            ConfigError::InvalidUser { .. }
        ));
        assert!(parse_users(":pw").is_err());
        let err = parse_users("carol:pw:owner").unwrap_err();
        assert!(err.to_string().contains("carol"));
        // The secret is never echoed back
        assert!(!err.to_string().contains("pw"));
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert!(config.users.is_empty());
        assert!(config.cors_permissive);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("BINGO_BIND", "127.0.0.1:8080");
        std::env::set_var("BINGO_DATA_FILE", "/tmp/bingo.json");
        std::env::set_var("BINGO_USERS", "alice:pw");
        std::env::set_var("BINGO_CORS_PERMISSIVE", "false");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.data_file, PathBuf::from("/tmp/bingo.json"));
        assert_eq!(config.users.len(), 1);
        assert!(!config.cors_permissive);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_bind() {
        clear_env();
        std::env::set_var("BINGO_BIND", "not-an-address");
        assert_eq!(
            AppConfig::from_env().unwrap_err(),
            ConfigError::InvalidBind("not-an-address".to_string())
        );
        clear_env();
    }
}
