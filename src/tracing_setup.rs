use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize tracing from the `[logging]` section.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .wrap_err_with(|| format!("Invalid log level: {}", config.level))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if config.json {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.json().with_current_span(false).with_span_list(true))
            .try_init()
            .wrap_err("Failed to install JSON tracing subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console tracing subscriber")?;
    }

    tracing::info!(
        level = %config.level,
        json = config.json,
        "canonize logging initialized"
    );
    Ok(())
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, uri: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.uri = uri,
        http.status_code = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggingConfig {
            level: "canonize=verbose".to_string(),
            json: false,
        };
        // Only meaningful when RUST_LOG does not override the level.
        if std::env::var("RUST_LOG").is_err() {
            assert!(init_tracing(&config).is_err());
        }
    }

    #[test]
    fn test_create_request_span() {
        let span = create_request_span("GET", "/Foo");
        assert!(
            span.metadata()
                .is_none_or(|meta| meta.name() == "request")
        );
    }
}
