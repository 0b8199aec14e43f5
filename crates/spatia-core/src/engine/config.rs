use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default point-count threshold above which nearest-neighbor queries are
/// routed to the k-d tree. Linear scans beat tree overhead below it.
pub const DEFAULT_NN_INDEX_THRESHOLD: usize = 15;

/// Default point-count threshold above which sphere cutouts use the index's
/// range search. Tuned independently of the nearest-neighbor threshold:
/// a range query amortizes tree construction later than repeated
/// nearest-neighbor lookups do.
pub const DEFAULT_CUTOUT_INDEX_THRESHOLD: usize = 100;

/// Size thresholds steering the adaptive query policies.
///
/// Every [`PointSet`](crate::engine::points::PointSet) carries a config by
/// value; derived sets (cutouts, subsets) inherit it from their parent.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ProximityConfig {
    /// Sets with at most this many points answer nearest-neighbor queries by
    /// linear scan; larger sets build and use the spatial index.
    pub nn_index_threshold: usize,
    /// Sets with at most this many points answer sphere cutouts by linear
    /// filtering; larger sets use the index's range search.
    pub cutout_index_threshold: usize,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            nn_index_threshold: DEFAULT_NN_INDEX_THRESHOLD,
            cutout_index_threshold: DEFAULT_CUTOUT_INDEX_THRESHOLD,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl ProximityConfig {
    /// Loads thresholds from a TOML file. Missing keys fall back to the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}
