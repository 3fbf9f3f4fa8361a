//! Transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum frame payload: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// TCP transport configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Largest accepted payload in bytes.
    pub max_frame_size: usize,
    /// Outbound connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle read timeout per connection in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
