//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase anonymous key, sent as `apikey` on every request
    pub supabase_anon_key: String,
    /// Supabase JWT secret for access token verification
    pub supabase_jwt_secret: String,
    /// Table holding store profiles
    pub stores_table: String,

    /// Public origin used to build shareable store links
    pub public_base_url: String,
    /// Mark session cookies `Secure` (enable behind HTTPS)
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let secure_cookies = match env::var("SECURE_COOKIES") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag("SECURE_COOKIES"))?,
            Err(_) => false,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            supabase_url: env::var("SUPABASE_URL")
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?,
            stores_table: env::var("STORES_TABLE").unwrap_or_else(|_| "stores".to_string()),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .map_err(|_| ConfigError::Missing("PUBLIC_BASE_URL"))?
                .trim_end_matches('/')
                .to_string(),
            secure_cookies,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid boolean in environment variable: {0}")]
    InvalidFlag(&'static str),
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "debug".to_string(),
        supabase_url: "http://127.0.0.1:9".to_string(),
        supabase_anon_key: "anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        stores_table: "stores".to_string(),
        public_base_url: "https://links.example.com".to_string(),
        secure_cookies: false,
    }
}
