#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// How long and how often a run is polled for its status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> PollPolicy {
        return PollPolicy {
            interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(8000),
            timeout: Duration::from_millis(120_000),
        };
    }
}

impl PollPolicy {
    pub fn from_config() -> Result<PollPolicy> {
        return Ok(PollPolicy {
            interval: Config::get_millis(ConfigKey::PollInterval)?,
            max_interval: Config::get_millis(ConfigKey::PollMaxInterval)?,
            timeout: Config::get_millis(ConfigKey::RunTimeout)?,
        });
    }

    /// Doubles the wait between status checks, capped at `max_interval`. A
    /// `max_interval` below `interval` pins the wait to `interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let cap = self.max_interval.max(self.interval);
        return current.saturating_mul(2).min(cap);
    }
}
