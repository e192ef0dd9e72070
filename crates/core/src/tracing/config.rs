//! Configuration for tracing and instrumentation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name, used as the default filter target
    pub service_name: String,
    /// Log level filter (e.g., "info", "debug", "examkit_http=trace")
    pub log_level: String,
    /// Console output format
    #[serde(default)]
    pub format: LogFormat,
    /// Optional file that receives a copy of every event (without ANSI colours)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "examkit".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

impl InstrumentationConfig {
    /// Create configuration from environment variables
    ///
    /// Only `EXAMKIT_LOG_FORMAT` (`json` for structured output) is read here.
    /// `RUST_LOG` is applied by the subscriber itself and takes precedence
    /// over `log_level`.
    pub fn from_env() -> Self {
        let format = match std::env::var("EXAMKIT_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            format,
            ..Self::default()
        }
    }

    /// Filter directive covering the examkit crates at the configured level
    ///
    /// A `log_level` that already contains a directive (`target=level`) is
    /// passed through unchanged.
    pub fn filter_directive(&self) -> String {
        if self.log_level.contains('=') {
            return self.log_level.clone();
        }
        let level = &self.log_level;
        format!("{}={level},examkit_core={level},examkit_http={level}", self.service_name)
    }
}
