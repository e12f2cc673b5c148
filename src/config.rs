//! Startup configuration for the key bridge.
//!
//! Everything here is decided once, before the audio stream starts. The key
//! map itself lives in [`crate::rt::KeyMap`] because it is generic over the
//! action type.

use std::{path::PathBuf, time::Duration};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEVICE: &str = "/dev/input/event1";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);
pub const DEFAULT_THREAD_NAME: &str = "keygate-input";

/// Who drives the poller loop.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// One poll cycle per audio block; the consumer re-arms the poller after
    /// every block. Latency is one block period.
    #[default]
    Cooperative,
    /// The poller cycles continuously on its own thread.
    FreeRunning,
}

/// How often, and how patiently, the poller tries to (re)open the device.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total open attempts, including the first. Values below 1 act as 1.
    pub attempts: u32,
    /// Wait before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt: a missing device leaves input inert.
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Delay to wait after failed attempt number `failed` (1-based).
    pub fn backoff(&self, failed: u32) -> Duration {
        let doublings = failed.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

/// Poller settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub device: PathBuf,
    pub poll_timeout: Duration,
    pub schedule: ScheduleMode,
    pub retry: RetryPolicy,
    pub thread_name: String,
}

impl BridgeConfig {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn schedule(mut self, mode: ScheduleMode) -> Self {
        self.schedule = mode;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            schedule: ScheduleMode::default(),
            retry: RetryPolicy::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}
