use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Staging,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "staging" => Self::Staging,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub app: ApplicationConfig,
    pub store: StoreConfig,
    pub generation: GenerationConfig,
    pub limits: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` first when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Like [`AppConfig::load`], but store and generation credentials may be absent.
    pub fn load_without_credentials() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(false)
    }

    fn from_env() -> Result<Self, ConfigError> {
        Self::build(true)
    }

    fn build(require_credentials: bool) -> Result<Self, ConfigError> {
        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let debug = match env::var("APP_DEBUG") {
            Ok(raw) => parse_flag("APP_DEBUG", &raw)?,
            Err(_) => environment != AppEnvironment::Production,
        };

        let app = ApplicationConfig {
            name: env::var("APP_NAME").unwrap_or_else(|_| "Cliro Notes".to_string()),
            version: env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            debug,
            max_languages_per_user: parse_number("MAX_LANGUAGES_PER_USER", 3)?,
        };

        let store = StoreConfig {
            url: credential("SUPABASE_URL", require_credentials)?,
            service_key: credential("SUPABASE_SERVICE_KEY", require_credentials)?,
            timeout: Duration::from_secs(parse_number("STORE_TIMEOUT_SECS", 10)?),
            probe_interval: Duration::from_secs(parse_number("STORE_PROBE_INTERVAL_SECS", 300)?),
        };

        let generation = GenerationConfig {
            api_key: credential("GEMINI_API_KEY", require_credentials)?,
            model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            timeout: Duration::from_secs(parse_number("GENERATION_TIMEOUT_SECS", 60)?),
        };

        let limits = RateLimitConfig {
            waitlist_join_per_minute: parse_number("WAITLIST_JOIN_LIMIT_PER_MINUTE", 5)?,
            ai_requests_per_hour: parse_number("AI_RATE_LIMIT_PER_HOUR", 100)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            app,
            store,
            generation,
            limits,
        })
    }
}

fn credential(key: &'static str, required: bool) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ if required => Err(ConfigError::Missing { key }),
        _ => Ok(String::new()),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Product metadata surfaced to clients.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: String,
    /// Expose internal error detail in 500 responses.
    pub debug: bool,
    pub max_languages_per_user: usize,
}

/// Remote table store (PostgREST/Supabase) connection settings.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub service_key: String,
    pub timeout: Duration,
    pub probe_interval: Duration,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("probe_interval", &self.probe_interval)
            .finish_non_exhaustive()
    }
}

/// Hosted text-generation endpoint settings.
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// In-process request budgets.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub waitlist_join_per_minute: u32,
    pub ai_requests_per_hour: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("{key} is required")]
    Missing { key: &'static str },
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be a boolean flag, got '{value}'")]
    InvalidFlag { key: &'static str, value: String },
}
