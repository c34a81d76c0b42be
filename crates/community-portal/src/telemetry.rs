use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Client crates that log every request at debug level.
const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{value}' in APP_LOG_LEVEL")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("could not install the tracing subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expand a bare level such as `debug` so the portal logs at that level
/// while the HTTP client stack stays at `warn`. Full filter strings pass
/// through untouched.
pub(crate) fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
    directives.join(",")
}

fn configured_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter_directives(&config.log_level)).map_err(|source| {
        TelemetryError::EnvFilter {
            value: config.log_level.clone(),
            source,
        }
    })
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `APP_LOG_LEVEL`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
