//! Tracing bootstrap
//!
//! Installs a global `tracing-subscriber` fmt subscriber filtered by
//! `RUST_LOG` (default `info`).

use affinity_core::{AffinityError, AffinityResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Install the global subscriber.
///
/// Fails with [`AffinityError::Logging`] if one is already installed.
pub fn init_tracing(format: LogFormat) -> AffinityResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| AffinityError::Logging(e.to_string()))
}
