use serde::{Deserialize, Serialize};

use crate::OutlierError;

/// Tuning knobs for the isolation-forest ensemble.
///
/// `contamination` is the expected fraction of anomalous rows and drives the
/// decision threshold. On small user-entered batches a fixed 1% rate can
/// mathematically prevent any flag (anything below `1/N` rounds to zero picks),
/// so `adaptive_contamination` floors the effective rate at `1/N` by default;
/// switch it off to get the raw fixed-rate behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutlierConfig {
    /// Expected fraction of anomalous rows, in `(0, 0.5]`.
    pub contamination: f64,
    /// Floor the effective contamination at `1/N` for an N-row batch.
    pub adaptive_contamination: bool,
    /// Number of isolation trees in the ensemble.
    pub tree_count: usize,
    /// Upper bound on the subsample used to grow each tree.
    pub max_samples: usize,
    /// Fixed RNG seed for reproducible runs; `None` draws from system entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            contamination: 0.01,
            adaptive_contamination: true,
            tree_count: 100,
            max_samples: 256,
            seed: None,
        }
    }
}

impl OutlierConfig {
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_adaptive_contamination(mut self, adaptive: bool) -> Self {
        self.adaptive_contamination = adaptive;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tree_count(mut self, tree_count: usize) -> Self {
        self.tree_count = tree_count;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), OutlierError> {
        if !self.contamination.is_finite() || self.contamination <= 0.0 || self.contamination > 0.5
        {
            return Err(OutlierError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.tree_count == 0 {
            return Err(OutlierError::InvalidConfig(
                "tree_count must be >= 1".into(),
            ));
        }
        if self.max_samples < 2 {
            return Err(OutlierError::InvalidConfig(
                "max_samples must be >= 2".into(),
            ));
        }
        Ok(())
    }

    /// Effective contamination for an `n`-row batch.
    pub(crate) fn effective_contamination(&self, n: usize) -> f64 {
        if self.adaptive_contamination && n > 0 {
            self.contamination.max(1.0 / n as f64)
        } else {
            self.contamination
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = OutlierConfig::default();
        assert_eq!(cfg.contamination, 0.01);
        assert!(cfg.adaptive_contamination);
        assert_eq!(cfg.tree_count, 100);
        assert_eq!(cfg.max_samples, 256);
        assert!(cfg.seed.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_style_setters() {
        let cfg = OutlierConfig::default()
            .with_contamination(0.2)
            .with_seed(42)
            .with_tree_count(50);
        assert_eq!(cfg.contamination, 0.2);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.tree_count, 50);
    }

    #[test]
    fn contamination_out_of_range_rejected() {
        assert!(OutlierConfig::default()
            .with_contamination(0.0)
            .validate()
            .is_err());
        assert!(OutlierConfig::default()
            .with_contamination(0.7)
            .validate()
            .is_err());
        assert!(OutlierConfig::default()
            .with_contamination(f64::NAN)
            .validate()
            .is_err());
        assert!(OutlierConfig::default()
            .with_contamination(0.5)
            .validate()
            .is_ok());
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(OutlierConfig::default().with_tree_count(0).validate().is_err());
    }

    #[test]
    fn adaptive_floor_kicks_in_for_small_batches() {
        let cfg = OutlierConfig::default(); // 1% fixed rate
        assert!((cfg.effective_contamination(9) - 1.0 / 9.0).abs() < 1e-12);
        // Large batches keep the configured rate.
        assert_eq!(cfg.effective_contamination(1000), 0.01);
    }

    #[test]
    fn fixed_rate_when_adaptive_disabled() {
        let cfg = OutlierConfig::default().with_adaptive_contamination(false);
        assert_eq!(cfg.effective_contamination(9), 0.01);
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = OutlierConfig::default().with_seed(7).with_contamination(0.1);
        let serialized = serde_json::to_string(&cfg).unwrap();
        let deserialized: OutlierConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }
}
