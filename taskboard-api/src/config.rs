/// Configuration management for the API server
///
/// Configuration is read once at start-up from environment variables (after
/// loading `.env` when present) into an immutable [`Config`].
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PREFIX`: Path prefix of the resource routes (default: /api)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, 32+ characters)
/// - `ACCESS_TOKEN_EXPIRE_MINUTES`: Session lifetime (default: 10080)
/// - `RESET_TOKEN_EXPIRE_MINUTES`: Reset token lifetime (default: 60)
/// - `MAIL_API_URL`: Transactional email endpoint; mail is only logged when unset
/// - `MAIL_API_KEY`: Bearer key for the email endpoint
/// - `MAIL_FROM`: Sender address (default: no-reply@taskboard.local)
/// - `FRONTEND_URL`: Base of the password reset link (default: http://localhost:3000)
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use taskboard_shared::auth::tokens::TokenService;
use taskboard_shared::db::pool::DatabaseConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Prefix the resource routes are nested under; `/health` is not prefixed
    pub prefix: String,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_token_minutes: i64,
    pub reset_token_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[redacted]")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("reset_token_minutes", &self.reset_token_minutes)
            .finish()
    }
}

/// Outbound email configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub frontend_url: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a required one is missing or
    /// a value cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let jwt_secret =
            lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let access_token_minutes: i64 = parse(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            &var("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let reset_token_minutes: i64 = parse(
            "RESET_TOKEN_EXPIRE_MINUTES",
            &var("RESET_TOKEN_EXPIRE_MINUTES", "60"),
        )?;

        if access_token_minutes <= 0 || reset_token_minutes <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: parse("API_PORT", &var("API_PORT", "8080"))?,
                prefix: normalize_prefix(&var("API_PREFIX", "/api")),
                cors_origins: var("CORS_ORIGINS", "*")
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse(
                    "DATABASE_MAX_CONNECTIONS",
                    &var("DATABASE_MAX_CONNECTIONS", "10"),
                )?,
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_token_minutes,
                reset_token_minutes,
            },
            mail: MailConfig {
                api_url: lookup("MAIL_API_URL").filter(|url| !url.is_empty()),
                api_key: lookup("MAIL_API_KEY").filter(|key| !key.is_empty()),
                from: var("MAIL_FROM", "no-reply@taskboard.local"),
                frontend_url: var("FRONTEND_URL", "http://localhost:3000"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token service configured with the JWT section
    pub fn token_service(&self) -> TokenService {
        TokenService::new(
            self.jwt.secret.clone(),
            Duration::minutes(self.jwt.access_token_minutes),
            Duration::minutes(self.jwt.reset_token_minutes),
        )
    }
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value: {:?}", key, value))
}

/// `""` and `"/"` mean no prefix; otherwise a leading slash and no trailing one
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
