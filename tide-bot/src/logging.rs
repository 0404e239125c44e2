use tide_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level when set.
pub fn init(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

// serenity is chatty at info; keep it to warnings unless asked.
fn default_directives(level: &str) -> String {
    format!("{level},serenity=warn")
}
