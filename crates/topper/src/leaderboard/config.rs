use std::time::Duration;

use super::budget::LikePolicy;
use super::sweep::SweepPolicy;

/// Tunables for the rating engine: like budget, sweep reward, and sweep cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardConfig {
    pub likes: LikePolicy,
    pub sweep: SweepPolicy,
    pub sweep_enabled: bool,
    pub sweep_interval: Duration,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            likes: LikePolicy::default(),
            sweep: SweepPolicy::default(),
            sweep_enabled: true,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}
