//! Tracing setup for the command-line tool.

use crate::config::LoggingConfig;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the configured level. A
/// subscriber that is already installed is left in place.
pub fn init_logging(config: &LoggingConfig) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter(config))
        .with_writer(std::io::stderr);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(
            builder
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_keeps_first_subscriber() {
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig {
            json: true,
            ..LoggingConfig::default()
        });
        tracing::info!("still logging");
    }
}
