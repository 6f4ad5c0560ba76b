//! Runtime configuration, read from environment variables.
//!
//! `main` loads a `.env` file first (via `dotenv`), so every setting below can
//! live there during development.

use std::env;
use std::fmt;

/// Errors raised while assembling [`Config`].
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable with no sensible default is absent.
    Missing(&'static str),
    /// A variable is present but cannot be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Signing settings for issued bearer tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub expires_in_secs: i64,
}

/// Allowed origins for cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub origins: CorsOrigins,
    pub max_age: usize,
}

pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub mongo_uri: String,
    pub database_name: String,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Tests use this to avoid mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            server_host: text("SERVER_HOST", "0.0.0.0"),
            server_port: parse(&lookup, "SERVER_PORT", 3000)?,
            mongo_uri: text("MONGO_URI", "mongodb://localhost:27017"),
            database_name: text("DB_NAME", "portfolio"),
            jwt: JwtConfig {
                secret,
                issuer: text("JWT_ISSUER", "demoBackend"),
                expires_in_secs: parse(&lookup, "JWT_EXPIRES_IN", 3600)?,
            },
            bcrypt_cost: parse(&lookup, "BCRYPT_COST", 10)?,
            cors: CorsConfig {
                origins: parse_origins(&text("CORS_ALLOWED_ORIGINS", "*")),
                max_age: parse(&lookup, "CORS_MAX_AGE", 3600)?,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
        assert_eq!(config.database_name, "portfolio");
        assert_eq!(config.jwt.issuer, "demoBackend");
        assert_eq!(config.jwt.expires_in_secs, 3600);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.cors.origins, CorsOrigins::Any);
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "8080"),
            ("DB_NAME", "catalog_test"),
            ("JWT_EXPIRES_IN", "60"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.database_name, "catalog_test");
        assert_eq!(config.jwt.expires_in_secs, 60);
        assert_eq!(
            config.cors.origins,
            CorsOrigins::List(vec!["http://a.test".into(), "http://b.test".into()])
        );
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[])).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "eighty"),
        ]))
        .err();
        assert_eq!(
            err,
            Some(ConfigError::Invalid {
                key: "SERVER_PORT",
                value: "eighty".into()
            })
        );
    }
}
