//! Coordinator configuration.

use shared_types::{parse_address, Address};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Default account the coordinator's tokens are held under.
pub const DEFAULT_COORDINATOR_ACCOUNT: Address = [
    0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00, 0x0c, 0x00,
    0x0c, 0x00, 0x0c, 0x01,
];

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Token-ledger account that holds every escrowed and withdrawable unit.
    pub coordinator_account: Address,
    /// Upper bound on one consumer callback.
    pub callback_timeout: Duration,
    /// Upper bound on one token-ledger call.
    pub transfer_timeout: Duration,
    /// Upper bound on oracles per agreement.
    pub max_oracles: usize,
    /// Event bus channel capacity.
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            coordinator_account: DEFAULT_COORDINATOR_ACCOUNT,
            callback_timeout: Duration::from_millis(5_000),
            transfer_timeout: Duration::from_millis(10_000),
            max_oracles: 64,
            event_capacity: 1024,
        }
    }
}

fn env_parsed<T, F>(name: &str, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Option<T>,
{
    let raw = env::var(name).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(variable = name, value = %raw, "ignoring malformed environment value");
    }
    parsed
}

fn parse_positive(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|n| *n > 0)
}

impl CoordinatorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OC_COORDINATOR_ACCOUNT`: hex address
    /// - `OC_CALLBACK_TIMEOUT_MS`: callback bound (default: 5000)
    /// - `OC_TRANSFER_TIMEOUT_MS`: token-ledger bound (default: 10000)
    /// - `OC_MAX_ORACLES`: oracles per agreement (default: 64)
    /// - `OC_EVENT_CAPACITY`: event channel capacity (default: 1024)
    ///
    /// Malformed values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            coordinator_account: env_parsed("OC_COORDINATOR_ACCOUNT", parse_address)
                .unwrap_or(defaults.coordinator_account),
            callback_timeout: env_parsed("OC_CALLBACK_TIMEOUT_MS", |v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.callback_timeout),
            transfer_timeout: env_parsed("OC_TRANSFER_TIMEOUT_MS", |v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.transfer_timeout),
            max_oracles: env_parsed("OC_MAX_ORACLES", parse_positive)
                .unwrap_or(defaults.max_oracles),
            event_capacity: env_parsed("OC_EVENT_CAPACITY", parse_positive)
                .unwrap_or(defaults.event_capacity),
        }
    }
}
