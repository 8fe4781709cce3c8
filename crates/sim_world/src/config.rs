//! World configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for one world and its tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Spatial grid cells are `2^spatial_rank` units on a side.
    pub spatial_rank: u32,
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            spatial_rank: 5,
            tick_rate: 20.0,
            max_ticks: 0,
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn with_spatial_rank(mut self, rank: u32) -> Self {
        self.spatial_rank = rank;
        self
    }

    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Seconds per tick.
    #[must_use]
    pub fn tick_interval(&self) -> f64 {
        1.0 / self.tick_rate
    }

    /// The tick interval as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TickRate`] unless the rate is positive, finite
    /// and yields a non-zero interval that fits in a `Duration`.
    pub fn tick_duration(&self) -> Result<Duration, ConfigError> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        match Duration::try_from_secs_f64(self.tick_interval()) {
            Ok(duration) if !duration.is_zero() => Ok(duration),
            _ => Err(ConfigError::TickRate(self.tick_rate)),
        }
    }

    /// Check every field. [`World::new`](crate::World::new) calls this.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spatial_rank >= i32::BITS {
            return Err(ConfigError::SpatialRank(self.spatial_rank));
        }
        self.tick_duration().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.spatial_rank, 5);
        assert_eq!(config.max_ticks, 0);
        assert!((config.tick_interval() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_builder_overrides() {
        let config = WorldConfig::default()
            .with_spatial_rank(3)
            .with_tick_rate(1000.0)
            .with_max_ticks(5);
        assert_eq!(config.spatial_rank, 3);
        assert_eq!(config.tick_rate, 1000.0);
        assert_eq!(config.max_ticks, 5);
    }

    #[test]
    fn test_default_is_valid() {
        let config = WorldConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.tick_duration(), Ok(Duration::from_millis(50)));
    }

    #[test]
    fn test_bad_tick_rates_are_rejected() {
        for rate in [0.0, -20.0, f64::NAN, f64::INFINITY, 1e-300, 1e300] {
            let config = WorldConfig::default().with_tick_rate(rate);
            assert!(
                matches!(config.validate(), Err(ConfigError::TickRate(_))),
                "rate {rate} accepted"
            );
        }
    }

    #[test]
    fn test_spatial_rank_must_fit_a_shift() {
        let config = WorldConfig::default().with_spatial_rank(32);
        assert_eq!(config.validate(), Err(ConfigError::SpatialRank(32)));
        assert_eq!(WorldConfig::default().with_spatial_rank(31).validate(), Ok(()));
    }
}
