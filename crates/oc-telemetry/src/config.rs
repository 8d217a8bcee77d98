//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or an `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "oracle-coordinator".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OC_SERVICE_NAME`: Service name (default: oracle-coordinator)
    /// - `OC_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `OC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `OC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("OC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("OC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("OC_CONSOLE_OUTPUT")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.console_output),

            json_logs: env::var("OC_JSON_LOGS")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(is_container),
        }
    }
}
