//! Tunables for discovery, transfer and scheduling.

use crate::id::ItemTypeId;
use crate::world::MarkerLabels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Errors from [`PipeConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cycle_interval must be at least 1")]
    ZeroInterval,
    #[error("stack_capacity must be at least 1")]
    ZeroCapacity,
    #[error("{field} must be at least 1")]
    ZeroLimit { field: &'static str },
    #[error("marker labels must be distinct and non-empty")]
    AmbiguousLabels,
}

/// Configuration shared by every pipe service component.
///
/// Every field has a default, so config files only need to name what they
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Host cycles between two scheduler firings.
    pub cycle_interval: u64,
    /// Largest number of outputs one network may have.
    pub max_outputs: usize,
    /// Largest number of connector cells one network may have.
    pub max_connectors: usize,
    /// Item types that go into a smelter's fuel slot.
    pub fuel_types: BTreeSet<ItemTypeId>,
    /// Maximum quantity a smelter slot holds when merging.
    pub stack_capacity: u32,
    /// When true, unfiltered priority tiers skip outputs whose filter is
    /// non-empty. When false, those tiers accept any output.
    pub strict_filters: bool,
    /// Cycles after which an open loop detection is closed without a report.
    /// `None` keeps detections open until their requester stops them.
    pub detection_ttl: Option<u64>,
    /// Labels recognized by the default classifier.
    pub labels: MarkerLabels,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            cycle_interval: 20,
            max_outputs: 128,
            max_connectors: 2048,
            fuel_types: BTreeSet::new(),
            stack_capacity: 64,
            strict_filters: true,
            detection_ttl: None,
            labels: MarkerLabels::default(),
        }
    }
}

impl PipeConfig {
    pub fn with_fuel(mut self, fuel: impl IntoIterator<Item = ItemTypeId>) -> Self {
        self.fuel_types.extend(fuel);
        self
    }

    pub fn is_fuel(&self, item_type: ItemTypeId) -> bool {
        self.fuel_types.contains(&item_type)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_outputs == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_outputs",
            });
        }
        if self.max_connectors == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_connectors",
            });
        }
        if self.detection_ttl == Some(0) {
            return Err(ConfigError::ZeroLimit {
                field: "detection_ttl",
            });
        }
        let l = &self.labels;
        let labels = [&l.input, &l.output, &l.loader];
        if labels.iter().any(|s| s.is_empty())
            || l.input == l.output
            || l.input == l.loader
            || l.output == l.loader
        {
            return Err(ConfigError::AmbiguousLabels);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipeConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.stack_capacity, 64);
        assert!(config.strict_filters);
        assert!(config.detection_ttl.is_none());
    }

    #[test]
    fn zero_interval_rejected() {
        let config = PipeConfig {
            cycle_interval: 0,
            ..PipeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn zero_limits_rejected() {
        let config = PipeConfig {
            max_connectors: 0,
            ..PipeConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroLimit {
                field: "max_connectors"
            })
        );
    }

    #[test]
    fn duplicate_labels_rejected() {
        let mut config = PipeConfig::default();
        config.labels.output = config.labels.input.clone();
        assert_eq!(config.validate(), Err(ConfigError::AmbiguousLabels));
    }

    #[test]
    fn fuel_lookup() {
        let config = PipeConfig::default().with_fuel([ItemTypeId(7)]);
        assert!(config.is_fuel(ItemTypeId(7)));
        assert!(!config.is_fuel(ItemTypeId(8)));
    }
}
