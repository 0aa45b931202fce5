use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub server: ServerConfig,
    pub odoo: OdooConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub allowed_hosts: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OdooConfig {
    pub url: String,
    pub db: String,
    pub username: String,
    pub password: String,
    /// When set, API-key authentication is used and credentials are ignored.
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Limit spec as "N/period", e.g. "60/minute".
    pub spec: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_headers: bool,
    pub enable_max_body_size: bool,
    pub max_request_body_bytes: u64,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| {
                AppError::Configuration("SERVER_PORT must be a valid port number".to_string())
            })?;

        // CORS origins and allowed hosts
        let cors_origins = split_list(&env::var("API_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));
        let allowed_hosts =
            split_list(&env::var("API_ALLOWED_HOSTS").unwrap_or_else(|_| "*".to_string()));

        // Odoo upstream
        let odoo_url = env::var("ODOO_URL").unwrap_or_else(|_| "http://localhost:8069".to_string());
        let odoo_db = env::var("ODOO_DB").unwrap_or_else(|_| "odoo".to_string());
        let odoo_username = env::var("ODOO_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let odoo_password = env::var("ODOO_PASSWORD").unwrap_or_else(|_| "admin".to_string());
        let odoo_api_key = env::var("ODOO_API_KEY").ok().filter(|k| !k.is_empty());

        // Rate limiting
        let rate_limit_enabled = parse_bool("API_ENABLE_RATE_LIMIT", true)?;
        let rate_limit_spec =
            env::var("API_RATE_LIMIT_DEFAULT").unwrap_or_else(|_| "60/minute".to_string());

        // Security hardening
        let enable_headers = parse_bool("API_ENABLE_SECURITY_HEADERS", true)?;
        let enable_max_body_size = parse_bool("API_ENABLE_MAX_BODY_SIZE", true)?;
        let max_request_body_bytes = env::var("API_MAX_REQUEST_BODY_BYTES")
            .unwrap_or_else(|_| "1048576".to_string())
            .parse::<u64>()
            .map_err(|_| {
                AppError::Configuration(
                    "API_MAX_REQUEST_BODY_BYTES must be a valid number".to_string(),
                )
            })?;

        Ok(Self {
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
                allowed_hosts,
            },
            odoo: OdooConfig {
                url: odoo_url,
                db: odoo_db,
                username: odoo_username,
                password: odoo_password,
                api_key: odoo_api_key,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                spec: rate_limit_spec,
            },
            security: SecurityConfig {
                enable_headers,
                enable_max_body_size,
                max_request_body_bytes,
            },
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(var: &str, default: bool) -> Result<bool, AppError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<bool>()
            .map_err(|_| AppError::Configuration(format!("{} must be true or false", var))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These assume the listed variables are absent from the test environment,
    // which is the case for a clean `cargo test` run.
    #[test]
    fn defaults_match_documented_values() {
        let settings = AppSettings::from_env().unwrap();

        assert_eq!(settings.odoo.url, "http://localhost:8069");
        assert_eq!(settings.odoo.db, "odoo");
        assert_eq!(settings.odoo.username, "admin");
        assert_eq!(settings.odoo.password, "admin");
        assert_eq!(settings.odoo.api_key, None);

        assert!(settings.rate_limit.enabled);
        assert_eq!(settings.rate_limit.spec, "60/minute");
        assert!(settings.security.enable_headers);
        assert!(settings.security.enable_max_body_size);
        assert_eq!(settings.security.max_request_body_bytes, 1_048_576);
        assert_eq!(settings.server.cors_origins, vec!["*"]);
        assert_eq!(settings.server.allowed_hosts, vec!["*"]);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn list_parsing_trims_and_drops_empty_entries() {
        assert_eq!(
            split_list("https://example.com, https://app.example.com ,"),
            vec!["https://example.com", "https://app.example.com"]
        );
        assert_eq!(split_list("*"), vec!["*"]);
    }
}
