//! On-disk shapes of the data files.
//!
//! Item types are referenced by name here; the loader resolves names into
//! [`ItemTypeId`](pipeworks_core::id::ItemTypeId)s.

use pipeworks_core::world::MarkerLabels;
use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// One entry of `items.{ron,toml,json}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    /// Goes into a smelter's fuel slot.
    #[serde(default)]
    pub fuel: bool,
}

/// TOML cannot hold a bare top-level array, so items sit under `[[items]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

// ===========================================================================
// Pipe configuration
// ===========================================================================

/// Contents of `pipes.{ron,toml,json}`. Omitted fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipeConfigData {
    pub cycle_interval: Option<u64>,
    pub max_outputs: Option<usize>,
    pub max_connectors: Option<usize>,
    pub stack_capacity: Option<u32>,
    pub strict_filters: Option<bool>,
    pub detection_ttl: Option<u64>,
    /// Extra fuel item names, on top of items flagged `fuel`.
    pub fuel: Vec<String>,
    pub labels: Option<MarkerLabels>,
}
