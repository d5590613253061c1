/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. It is built once at startup and shared
/// read-only afterwards.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGIN`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage when unset
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `ACCESS_TOKEN_SECRET` / `REFRESH_TOKEN_SECRET`: Signing keys (required)
/// - `ACCESS_TOKEN_EXPIRY` / `REFRESH_TOKEN_EXPIRY`: Lifetimes such as `15m` or `10d`
/// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`, `PASSWORD_HASH_PARALLELISM`
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use taskvault_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use taskvault_shared::auth::jwt::TokenConfig;
use taskvault_shared::auth::password::HashParams;

/// Minimum length of a token signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration; `None` selects in-memory storage
    pub database: Option<DatabaseConfig>,

    /// Token signing configuration
    pub tokens: TokenConfig,

    /// Password hashing cost
    pub password_hash: HashParams,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A token secret is missing, shorter than 32 characters, or both are equal
    /// - A numeric or duration variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api = ApiConfig {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("API_PORT", 8080)?,
            cors_origins: parse_origins(
                &env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            ),
            production: parse_var("PRODUCTION", false)?,
        };

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            _ => None,
        };

        let tokens = TokenConfig {
            access_secret: require_secret("ACCESS_TOKEN_SECRET")?,
            access_ttl: parse_duration_var("ACCESS_TOKEN_EXPIRY", Duration::minutes(15))?,
            refresh_secret: require_secret("REFRESH_TOKEN_SECRET")?,
            refresh_ttl: parse_duration_var("REFRESH_TOKEN_EXPIRY", Duration::days(10))?,
        };

        if tokens.access_secret == tokens.refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let defaults = HashParams::default();
        let password_hash = HashParams {
            memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        let log_format = match env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            api,
            database,
            tokens,
            password_hash,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn require_secret(name: &str) -> anyhow::Result<String> {
    let secret =
        env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))?;

    if secret.len() < MIN_SECRET_LEN {
        anyhow::bail!("{} must be at least {} characters long", name, MIN_SECRET_LEN);
    }

    Ok(secret)
}

fn parse_duration_var(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_duration(&raw).with_context(|| format!("{} is not a valid duration", name)),
        Err(_) => Ok(default),
    }
}

/// Parses `<n>[s|m|h|d]`; a bare number is seconds
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&raw[..i], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };

    let n: i64 = digits.parse().with_context(|| format!("invalid number {:?}", digits))?;
    if n <= 0 {
        anyhow::bail!("duration must be positive");
    }

    let duration = match unit {
        's' => Duration::try_seconds(n),
        'm' => Duration::try_minutes(n),
        'h' => Duration::try_hours(n),
        'd' => Duration::try_days(n),
        other => anyhow::bail!("unknown duration unit {:?}", other),
    };

    duration.ok_or_else(|| anyhow::anyhow!("duration out of range"))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
