//! Logging infrastructure
//!
//! `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` applies to this crate
//! and everything else logs at info.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogArgs, LogFormat};

/// Default filter directive for a given crate log level
pub fn default_directive(level: &str) -> String {
    format!("trustml_backend={},info", level)
}

/// Install the global tracing subscriber
pub fn init_tracing(args: &LogArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&args.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
    }
}
