/// Configuration management for the API server
///
/// Configuration is loaded from environment variables (a `.env` file is read
/// in development via dotenvy).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: full PostgreSQL connection string; overrides the parts
/// - `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`: connection
///   parts used when `DATABASE_URL` is not set
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `API_HOST`: host to bind to (default 0.0.0.0)
/// - `API_PORT`: port to bind to (default 8000)
/// - `JWT_SECRET`: secret key for JWT signing (required, min 32 bytes)
/// - `JWT_ALGORITHM`: signing algorithm (only HS256 is supported)
/// - `JWT_ACCESS_TTL_MINUTES`: access token lifetime (default 15)
/// - `JWT_REFRESH_TTL_DAYS`: refresh token lifetime (default 30)
/// - `BCRYPT_COST`: password hashing work factor (default 12)
///
/// The test database is configured the same way with a `TEST_` prefix
/// (`TEST_DATABASE_URL` or `TEST_DB_*`).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Password hashing configuration
    pub hashing: HashingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing (min 32 bytes)
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Signing algorithm; only HS256 is supported
    pub algorithm: String,

    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    /// Access token lifetime as a duration
    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_ttl_minutes)
    }

    /// Refresh token lifetime as a duration
    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

/// Password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// bcrypt cost parameter (the work factor)
    pub bcrypt_cost: u32,
}

/// Composes a postgres URL from `{prefix}HOST/PORT/USER/PASSWORD/NAME` parts
fn database_url_from_parts(prefix: &str) -> Option<String> {
    let host = env::var(format!("{prefix}DB_HOST")).unwrap_or_else(|_| "localhost".to_string());
    let port = env::var(format!("{prefix}DB_PORT")).unwrap_or_else(|_| "5432".to_string());
    let user = env::var(format!("{prefix}DB_USER")).ok()?;
    let password = env::var(format!("{prefix}DB_PASSWORD")).ok()?;
    let name = env::var(format!("{prefix}DB_NAME")).ok()?;

    Some(format!("postgresql://{user}:{password}@{host}:{port}/{name}"))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither `DATABASE_URL` nor the `DB_*` parts are set
    /// - `JWT_SECRET` is missing or shorter than 32 bytes
    /// - A numeric variable fails to parse or is out of range
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT").unwrap_or_else(|_| "8000".to_string()).parse::<u16>()?;

        let database_url = env::var("DATABASE_URL")
            .ok()
            .or_else(|| database_url_from_parts(""))
            .ok_or_else(|| anyhow::anyhow!("Set DATABASE_URL or DB_HOST/DB_PORT/DB_USER/DB_PASSWORD/DB_NAME"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_algorithm = env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());
        if jwt_algorithm != "HS256" {
            anyhow::bail!("JWT_ALGORITHM: only HS256 is supported, got {jwt_algorithm}");
        }

        let access_ttl_minutes = env::var("JWT_ACCESS_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()?;

        let refresh_ttl_days = env::var("JWT_REFRESH_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<i64>()?;

        let bcrypt_cost = env::var("BCRYPT_COST").unwrap_or_else(|_| "12".to_string()).parse::<u32>()?;

        if !(4..=31).contains(&bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between 4 and 31");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                algorithm: jwt_algorithm,
                access_ttl_minutes,
                refresh_ttl_days,
            },
            hashing: HashingConfig { bcrypt_cost },
        })
    }

    /// URL of the test database, if configured
    ///
    /// Reads `TEST_DATABASE_URL` or the `TEST_DB_*` parts.
    pub fn test_database_url() -> Option<String> {
        env::var("TEST_DATABASE_URL").ok().or_else(|| database_url_from_parts("TEST_"))
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/teamline_test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                algorithm: "HS256".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 30,
            },
            hashing: HashingConfig { bcrypt_cost: 4 },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_jwt_ttls() {
        let config = test_config();
        assert_eq!(config.jwt.access_ttl(), Duration::minutes(15));
        assert_eq!(config.jwt.refresh_ttl(), Duration::days(30));
    }
}
