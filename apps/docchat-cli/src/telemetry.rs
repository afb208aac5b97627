use docchat_core::config::{LogFormat, LoggingSettings};

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(settings: &LoggingSettings) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    match settings.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).init();
        }
    }
}
