//! Engine configuration.

use eg_01_elastic_grid::DEFAULT_FAN_OUT;
use serde::{Deserialize, Serialize};

/// Dissemination engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticConfig {
    /// Grid fan-out `n`: bounds every layout axis and the average cell size.
    pub fan_out: u8,
    /// Check `routerSig` on relay hops. Router directory membership is
    /// checked regardless.
    pub verify_router: bool,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            fan_out: DEFAULT_FAN_OUT,
            verify_router: true,
        }
    }
}

impl ElasticConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.fan_out == 0 {
            return Err("fan_out must be in 1..=255".to_string());
        }
        Ok(())
    }
}
