//! Data-driven setup for Pipeworks: item catalogs and pipe configuration
//! read from RON, TOML or JSON files.

pub mod loader;
pub mod schema;

pub use loader::{load_pipe_data, DataLoadError, ItemCatalog, PipeData};
