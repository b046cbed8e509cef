//! Configuration management and validation.
//!
//! Provides the configuration structure consulted by every pipeline stage:
//! target envelope, province-specific Y prefixes, legacy datum offsets and
//! the toggles for the heuristic and datum stages.

use crate::constants::{self, bounds, datum, scoring};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Target envelope in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for TargetBounds {
    fn default() -> Self {
        Self {
            min_x: bounds::MIN_X,
            max_x: bounds::MAX_X,
            min_y: bounds::MIN_Y,
            max_y: bounds::MAX_Y,
        }
    }
}

impl TargetBounds {
    pub fn x_in_range(&self, x: f64) -> bool {
        x.is_finite() && x >= self.min_x && x <= self.max_x
    }

    pub fn y_in_range(&self, y: f64) -> bool {
        y.is_finite() && y >= self.min_y && y <= self.max_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_in_range(x) && self.y_in_range(y)
    }
}

/// Planar offset in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarOffset {
    pub dx: f64,
    pub dy: f64,
}

/// Legacy datum selection and offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatumConfig {
    /// Documents before this year are treated as Madrid datum
    pub madrid_datum_before_year: i32,

    /// Documents before this year (and not Madrid) are treated as ED50
    pub ed50_before_year: i32,

    pub ed50_offset: PlanarOffset,

    pub madrid_offset: PlanarOffset,

    /// Constant offset applied when the Lambert grid cannot be inverted
    pub lambert_fallback_offset: PlanarOffset,
}

impl Default for DatumConfig {
    fn default() -> Self {
        Self {
            madrid_datum_before_year: datum::MADRID_DATUM_BEFORE_YEAR,
            ed50_before_year: datum::ED50_BEFORE_YEAR,
            ed50_offset: PlanarOffset {
                dx: datum::ED50_DX,
                dy: datum::ED50_DY,
            },
            madrid_offset: PlanarOffset {
                dx: datum::MADRID_DX,
                dy: datum::MADRID_DY,
            },
            lambert_fallback_offset: PlanarOffset {
                dx: datum::LAMBERT_FALLBACK_DX,
                dy: datum::LAMBERT_FALLBACK_DY,
            },
        }
    }
}

/// Global configuration for coordinate normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Target envelope every accepted value must fall in
    pub bounds: TargetBounds,

    /// Prefix for a five-digit Y when the province is unknown
    pub default_y_prefix: String,

    /// Province (lowercase, no accents) -> two-digit Y prefix
    pub province_y_prefixes: HashMap<String, String>,

    pub datum: DatumConfig,

    /// Run the heuristic rescue engine on values still out of range
    pub enable_heuristics: bool,

    /// Apply ED50 / Madrid datum offsets based on the document year
    pub enable_datum_shift: bool,

    /// Minimum score for a range-valid result to be valid
    pub min_valid_score: u8,

    /// Worker count for concurrent batch normalization
    pub workers: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let province_y_prefixes = constants::PROVINCE_Y_PREFIXES
            .iter()
            .map(|(province, prefix)| (province.to_string(), prefix.to_string()))
            .collect();

        Self {
            bounds: TargetBounds::default(),
            default_y_prefix: constants::DEFAULT_Y_PREFIX.to_string(),
            province_y_prefixes,
            datum: DatumConfig::default(),
            enable_heuristics: true,
            enable_datum_shift: true,
            min_valid_score: scoring::MIN_VALID_SCORE,
            workers: num_cpus::get(),
        }
    }
}

impl NormalizerConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;

        let config: NormalizerConfig = serde_json::from_str(&content).map_err(|e| {
            Error::serialization(
                format!("Invalid configuration file {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate thresholds for consistency
    pub fn validate(&self) -> Result<()> {
        if self.bounds.min_x >= self.bounds.max_x || self.bounds.min_y >= self.bounds.max_y {
            return Err(Error::configuration(format!(
                "Invalid target bounds: x [{}, {}], y [{}, {}]",
                self.bounds.min_x, self.bounds.max_x, self.bounds.min_y, self.bounds.max_y
            )));
        }

        let is_two_digits = |p: &str| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit());

        if !is_two_digits(&self.default_y_prefix) {
            return Err(Error::configuration(format!(
                "Default Y prefix '{}' must be exactly two digits",
                self.default_y_prefix
            )));
        }

        for (province, prefix) in &self.province_y_prefixes {
            if !is_two_digits(prefix) {
                return Err(Error::configuration(format!(
                    "Y prefix '{}' for province '{}' must be exactly two digits",
                    prefix, province
                )));
            }
        }

        if self.datum.madrid_datum_before_year > self.datum.ed50_before_year {
            return Err(Error::configuration(format!(
                "Madrid datum cutoff {} cannot be after ED50 cutoff {}",
                self.datum.madrid_datum_before_year, self.datum.ed50_before_year
            )));
        }

        if self.min_valid_score > 100 {
            return Err(Error::configuration(format!(
                "Minimum valid score {} exceeds 100",
                self.min_valid_score
            )));
        }

        if self.workers == 0 {
            return Err(Error::configuration(
                "Worker count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Two-digit Y prefix for a province, falling back to the default
    pub fn y_prefix_for(&self, province: Option<&str>) -> &str {
        province
            .map(constants::normalize_province_name)
            .and_then(|name| self.province_y_prefixes.get(&name))
            .map(String::as_str)
            .unwrap_or(&self.default_y_prefix)
    }

    pub fn with_bounds(mut self, bounds: TargetBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_default_y_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_y_prefix = prefix.into();
        self
    }

    pub fn with_province_prefix(
        mut self,
        province: impl AsRef<str>,
        prefix: impl Into<String>,
    ) -> Self {
        self.province_y_prefixes.insert(
            constants::normalize_province_name(province.as_ref()),
            prefix.into(),
        );
        self
    }

    /// Disable the heuristic rescue engine
    pub fn without_heuristics(mut self) -> Self {
        self.enable_heuristics = false;
        self
    }

    /// Disable document-year datum offsets
    pub fn without_datum_shift(mut self) -> Self {
        self.enable_datum_shift = false;
        self
    }

    pub fn with_min_valid_score(mut self, score: u8) -> Self {
        self.min_valid_score = score;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}
