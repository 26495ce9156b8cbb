//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page size of the popular-films query when the caller doesn't give one
pub const DEFAULT_POPULAR_COUNT: usize = 10;

/// Default location of the bundled seed data
pub const DEFAULT_DATA_DIR: &str = "data/filmorate";

/// Settings for a [`Filmorate`](crate::Filmorate) instance
///
/// Every field has a default, so a partial config file deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the seed `.dat` files
    pub data_dir: PathBuf,
    /// Used by `popular_films(None)`
    pub default_popular_count: usize,
}

impl AppConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_default_popular_count(mut self, count: usize) -> Self {
        self.default_popular_count = count;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_popular_count: DEFAULT_POPULAR_COUNT,
        }
    }
}
