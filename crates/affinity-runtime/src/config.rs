//! Affinity graph configuration

use std::time::Duration;

use affinity_cluster::PropagationConfig;
use affinity_core::{AffinityError, AffinityResult};
use serde::{Deserialize, Serialize};

/// Affinity graph configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityConfig {
    /// Length of one window period
    pub snapshot_interval: Duration,
    /// Full periods retained before data ages out
    pub period_count: usize,
    /// Label propagation pass cap
    pub max_iterations: usize,
    /// Record elapsed time, iterations and modularity per clustering run
    pub gather_statistics: bool,
    /// Fixed seed for propagation; random when unset
    pub seed: Option<u64>,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        AffinityConfig {
            snapshot_interval: Duration::from_secs(5 * 60),
            period_count: 1,
            max_iterations: 100,
            gather_statistics: false,
            seed: None,
        }
    }
}

impl AffinityConfig {
    /// Short periods, statistics on, fixed seed
    pub fn testing() -> Self {
        AffinityConfig {
            snapshot_interval: Duration::from_millis(20),
            period_count: 1,
            max_iterations: 100,
            gather_statistics: true,
            seed: Some(0),
        }
    }

    pub fn with_snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = interval;
        self
    }

    pub fn with_period_count(mut self, period_count: usize) -> Self {
        self.period_count = period_count;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_statistics(mut self, gather: bool) -> Self {
        self.gather_statistics = gather;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> AffinityResult<()> {
        if self.snapshot_interval.is_zero() {
            return Err(AffinityError::InvalidConfig(
                "snapshot interval must be non-zero".into(),
            ));
        }
        if self.period_count == 0 {
            return Err(AffinityError::InvalidConfig(
                "period count must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(AffinityError::InvalidConfig(
                "max iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn propagation(&self) -> PropagationConfig {
        PropagationConfig {
            max_iterations: self.max_iterations,
            seed: self.seed,
            gather_statistics: self.gather_statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AffinityConfig::default();
        assert_eq!(config.snapshot_interval, Duration::from_secs(300));
        assert_eq!(config.period_count, 1);
        assert!(!config.gather_statistics);
        assert!(config.validate().is_ok());
        assert!(AffinityConfig::testing().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let bad = [
            AffinityConfig::default().with_period_count(0),
            AffinityConfig::default().with_max_iterations(0),
            AffinityConfig::default().with_snapshot_interval(Duration::ZERO),
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(AffinityError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AffinityConfig = serde_json::from_str(
            r#"{ "period_count": 3, "snapshot_interval": { "secs": 30, "nanos": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.period_count, 3);
        assert_eq!(config.snapshot_interval, Duration::from_secs(30));
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_propagation_config() {
        let config = AffinityConfig::default()
            .with_seed(9)
            .with_statistics(true)
            .with_max_iterations(12);
        let propagation = config.propagation();
        assert_eq!(propagation.seed, Some(9));
        assert_eq!(propagation.max_iterations, 12);
        assert!(propagation.gather_statistics);
    }
}
