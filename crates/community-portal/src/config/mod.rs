use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
    pub portal: PortalConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let url = non_empty_var("BACKEND_URL");
        let anon_key = non_empty_var("BACKEND_ANON_KEY");
        if url.is_some() && anon_key.is_none() {
            return Err(ConfigError::MissingVar("BACKEND_ANON_KEY"));
        }

        let backend = BackendConfig {
            url: url.map(|value| value.trim_end_matches('/').to_string()),
            anon_key,
            timeout: Duration::from_secs(seconds_var("BACKEND_TIMEOUT_SECS", 15)?),
        };

        let portal = PortalConfig {
            cache_ttl: Duration::from_secs(seconds_var("CACHE_TTL_SECS", 300)?),
            redirect_delay: Duration::from_secs(seconds_var("REDIRECT_DELAY_SECS", 3)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            backend,
            portal,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn seconds_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSeconds(name)),
        None => Ok(default),
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

/// Connection details for the hosted backend. Without a URL the portal runs
/// against the in-memory backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }
}

/// Behavior knobs shared by the domain services.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub cache_ttl: Duration,
    pub redirect_delay: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            redirect_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeconds(&'static str),
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeconds(name) => {
                write!(f, "{name} must be a whole number of seconds")
            }
            ConfigError::MissingVar(name) => {
                write!(f, "{name} is required when BACKEND_URL is set")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
