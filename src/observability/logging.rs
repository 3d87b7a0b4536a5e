//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over `observability.log_level`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::schema::LogFormat;
use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is unset: the configured level for the
/// gateway and tower-http, warnings for everything else.
pub fn default_directives(level: &str) -> String {
    format!("warn,api_gateway={level},tower_http={level}")
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let format_layer = match config.log_format {
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Pretty => fmt::layer().with_target(true).boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .try_init();
}
