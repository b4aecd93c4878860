use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events follow the configured level. Everything else, sqlx and the HTTP stack
/// included, stays at `warn` unless the operator asks for more.
const SERVICE_TARGETS: [&str; 2] = ["hireloop", "hireloop_api"];
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directives}' (from APP_LOG_LEVEL '{value}')")]
    EnvFilter {
        value: String,
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expands a bare level such as `debug` into per-crate directives so that raising the service
/// level does not also turn on statement logging in sqlx. Full filter expressions pass through.
pub fn default_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    let mut directives = String::from(DEPENDENCY_LEVEL);
    for target in SERVICE_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level so operators can
/// turn on `hireloop=debug` or `sqlx=info` without touching the service config.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = default_directives(&config.log_level);
            EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                directives,
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_scopes_to_service_crates() {
        assert_eq!(
            default_directives("debug"),
            "warn,hireloop=debug,hireloop_api=debug"
        );
        assert_eq!(
            default_directives(" info "),
            "warn,hireloop=info,hireloop_api=info"
        );
    }

    #[test]
    fn explicit_filters_pass_through() {
        assert_eq!(default_directives("hireloop=trace"), "hireloop=trace");
        assert_eq!(default_directives("info,sqlx=debug"), "info,sqlx=debug");
    }

    #[test]
    fn expanded_directives_build_a_filter() {
        assert!(EnvFilter::try_new(default_directives("info")).is_ok());
        assert!(EnvFilter::try_new(default_directives("hireloop=debug,sqlx=warn")).is_ok());
    }
}
