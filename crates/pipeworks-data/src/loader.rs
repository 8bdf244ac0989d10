//! Reads data files and resolves them into core types.
//!
//! A data directory holds:
//!
//! - `items.{ron,toml,json}` (required): the item catalog;
//! - `pipes.{ron,toml,json}` (optional): overrides for [`PipeConfig`].
//!
//! Exactly one format may exist per base name. RON files accept bare values
//! for optional fields (`cycle_interval: 5` instead of `Some(5)`).

use crate::schema::{ItemData, PipeConfigData, TomlItems};
use pipeworks_core::config::{ConfigError, PipeConfig};
use pipeworks_core::id::ItemTypeId;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub const ITEMS_FILE: &str = "items";
pub const PIPES_FILE: &str = "pipes";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unknown item '{name}' in {file}")]
    UnknownItem { file: PathBuf, name: String },

    #[error("item '{name}' defined twice in {file}")]
    DuplicateItem { file: PathBuf, name: String },

    #[error("invalid pipe configuration in {file}: {source}")]
    InvalidConfig {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Probe order when looking for a file.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    pub fn of(path: &Path) -> Result<Format, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Format::ALL
            .into_iter()
            .find(|f| Some(f.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::Options::default()
                .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
                .from_str(content)
                .map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

// ===========================================================================
// File helpers
// ===========================================================================

/// Find `{base}.ron`, `{base}.toml` or `{base}.json` in `dir`.
///
/// More than one match is an error.
pub fn find_data_file(dir: &Path, base: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut hits = Format::ALL
        .into_iter()
        .map(|f| dir.join(format!("{base}.{}", f.extension())))
        .filter(|p| p.is_file());
    let first = hits.next();
    if let (Some(a), Some(b)) = (&first, hits.next()) {
        return Err(DataLoadError::ConflictingFormats {
            a: a.clone(),
            b,
        });
    }
    Ok(first)
}

pub fn require_data_file(dir: &Path, base: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Read and deserialize a file, choosing the format by extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path)?;
    format.parse(&content).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

fn read_items(path: &Path) -> Result<Vec<ItemData>, DataLoadError> {
    if Format::of(path)? == Format::Toml {
        read_file::<TomlItems>(path).map(|t| t.items)
    } else {
        read_file(path)
    }
}

// ===========================================================================
// Item catalog
// ===========================================================================

/// Item names mapped to dense ids in file order.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    ids: HashMap<String, ItemTypeId>,
    names: Vec<String>,
    fuel: BTreeSet<ItemTypeId>,
}

impl ItemCatalog {
    /// Build a catalog from item entries. `file` is only used in errors.
    pub fn from_items(items: Vec<ItemData>, file: &Path) -> Result<Self, DataLoadError> {
        let mut catalog = Self::default();
        for item in items {
            if catalog.ids.contains_key(&item.name) {
                return Err(DataLoadError::DuplicateItem {
                    file: file.to_path_buf(),
                    name: item.name,
                });
            }
            let id = ItemTypeId(catalog.names.len() as u32);
            if item.fuel {
                catalog.fuel.insert(id);
            }
            catalog.ids.insert(item.name.clone(), id);
            catalog.names.push(item.name);
        }
        Ok(catalog)
    }

    pub fn id(&self, name: &str) -> Option<ItemTypeId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: ItemTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Items flagged as fuel in the catalog file.
    pub fn fuel_types(&self) -> &BTreeSet<ItemTypeId> {
        &self.fuel
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn resolve(&self, name: &str, file: &Path) -> Result<ItemTypeId, DataLoadError> {
        self.id(name).ok_or_else(|| DataLoadError::UnknownItem {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    }
}

// ===========================================================================
// Pipe configuration
// ===========================================================================

/// Apply `data` over the defaults and resolve fuel names.
pub fn resolve_config(
    data: PipeConfigData,
    catalog: &ItemCatalog,
    file: &Path,
) -> Result<PipeConfig, DataLoadError> {
    let defaults = PipeConfig::default();
    let mut fuel_types = catalog.fuel_types().clone();
    for name in &data.fuel {
        fuel_types.insert(catalog.resolve(name, file)?);
    }

    let config = PipeConfig {
        cycle_interval: data.cycle_interval.unwrap_or(defaults.cycle_interval),
        max_outputs: data.max_outputs.unwrap_or(defaults.max_outputs),
        max_connectors: data.max_connectors.unwrap_or(defaults.max_connectors),
        fuel_types,
        stack_capacity: data.stack_capacity.unwrap_or(defaults.stack_capacity),
        strict_filters: data.strict_filters.unwrap_or(defaults.strict_filters),
        detection_ttl: data.detection_ttl.or(defaults.detection_ttl),
        labels: data.labels.unwrap_or(defaults.labels),
    };
    config
        .validate()
        .map_err(|source| DataLoadError::InvalidConfig {
            file: file.to_path_buf(),
            source,
        })?;
    Ok(config)
}

// ===========================================================================
// Entry point
// ===========================================================================

/// Everything loaded from one data directory.
#[derive(Debug, Clone)]
pub struct PipeData {
    pub items: ItemCatalog,
    pub config: PipeConfig,
}

/// Load the item catalog and pipe configuration from `dir`.
///
/// Without a `pipes` file the default configuration is used, with fuel
/// taken from the catalog.
pub fn load_pipe_data(dir: &Path) -> Result<PipeData, DataLoadError> {
    let items_path = require_data_file(dir, ITEMS_FILE)?;
    let items = ItemCatalog::from_items(read_items(&items_path)?, &items_path)?;

    let config = match find_data_file(dir, PIPES_FILE)? {
        Some(path) => resolve_config(read_file(&path)?, &items, &path)?,
        None => PipeConfig::default().with_fuel(items.fuel_types().iter().copied()),
    };

    tracing::debug!(
        dir = %dir.display(),
        items = items.len(),
        fuel = config.fuel_types.len(),
        "pipe data loaded"
    );
    Ok(PipeData { items, config })
}

// ===========================================================================
// Tests
// ===========================================================================
