//! Configuration for index construction and correlation runs.
//!
//! All types are serializable so a run can be described in JSON (or TOML
//! with the `toml` feature) and validated before any index is built.

use crate::error::{CorrelateError, Result};
use serde::{Deserialize, Serialize};

/// Chunk count per grid dimension used when nothing else is configured.
pub const DEFAULT_GRID_SPAN: usize = 50;

/// Upper bound for the grid span; beyond this the grid itself dominates memory.
pub const MAX_GRID_SPAN: usize = 4096;

/// Options controlling how a [`ChunkIndex`](crate::ChunkIndex) partitions its items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexOptions {
    /// Number of chunks per dimension.
    #[serde(default = "IndexOptions::default_grid_span")]
    pub grid_span: usize,

    /// Materialize the grid at construction instead of on first use.
    #[serde(default)]
    pub eager: bool,
}

impl IndexOptions {
    const fn default_grid_span() -> usize {
        DEFAULT_GRID_SPAN
    }

    pub fn with_grid_span(mut self, span: usize) -> Self {
        assert!(
            (1..=MAX_GRID_SPAN).contains(&span),
            "Grid span must be between 1 and {}",
            MAX_GRID_SPAN
        );

        if span > 1000 {
            log::warn!(
                "Grid span of {} allocates {} chunk slots; most will stay empty \
                unless the data set is very dense.",
                span,
                span * span
            );
        }

        self.grid_span = span;
        self
    }

    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_GRID_SPAN).contains(&self.grid_span) {
            return Err(CorrelateError::InvalidConfig(format!(
                "Grid span must be between 1 and {}, got: {}",
                MAX_GRID_SPAN, self.grid_span
            )));
        }
        Ok(())
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            grid_span: Self::default_grid_span(),
            eager: false,
        }
    }
}

/// Distance thresholds applied by the [`Correlator`](crate::Correlator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchOptions {
    /// Pairs farther apart than this are reported as far matches.
    #[serde(default = "MatchOptions::default_match_distance")]
    pub match_distance: f64,

    /// Search radius for candidates around each item.
    #[serde(default = "MatchOptions::default_unmatch_distance")]
    pub unmatch_distance: f64,
}

impl MatchOptions {
    const fn default_match_distance() -> f64 {
        100.0
    }

    const fn default_unmatch_distance() -> f64 {
        1000.0
    }

    pub fn new(match_distance: f64, unmatch_distance: f64) -> Self {
        Self {
            match_distance,
            unmatch_distance,
        }
    }

    pub fn with_match_distance(mut self, distance: f64) -> Self {
        self.match_distance = distance;
        self
    }

    pub fn with_unmatch_distance(mut self, distance: f64) -> Self {
        self.unmatch_distance = distance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("Match distance", self.match_distance),
            ("Unmatch distance", self.unmatch_distance),
        ] {
            if !value.is_finite() {
                return Err(CorrelateError::InvalidConfig(format!(
                    "{} must be finite, got: {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(CorrelateError::InvalidConfig(format!(
                    "{} must not be negative, got: {}",
                    name, value
                )));
            }
        }

        if self.match_distance > self.unmatch_distance {
            return Err(CorrelateError::InvalidConfig(format!(
                "Match distance ({}) must be <= unmatch distance ({})",
                self.match_distance, self.unmatch_distance
            )));
        }

        Ok(())
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            match_distance: Self::default_match_distance(),
            unmatch_distance: Self::default_unmatch_distance(),
        }
    }
}

/// Complete description of a correlation run.
///
/// # Example
///
/// ```rust
/// use spatio_correlate::Config;
///
/// let json = r#"{
///     "index": { "grid_span": 80 },
///     "matching": { "match_distance": 50.0, "unmatch_distance": 500.0 }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.index.grid_span, 80);
/// assert!(!config.index.eager);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub index: IndexOptions,

    #[serde(default)]
    pub matching: MatchOptions,
}

impl Config {
    pub fn with_index(mut self, index: IndexOptions) -> Self {
        self.index = index;
        self
    }

    pub fn with_matching(mut self, matching: MatchOptions) -> Self {
        self.matching = matching;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.index.validate()?;
        self.matching.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
