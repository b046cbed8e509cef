//! PTEL Coordinate Normalizer Library
//!
//! A Rust library for normalizing coordinate pairs transcribed in municipal
//! emergency-planning documents into a single canonical spatial reference,
//! UTM zone 30N on ETRS89 (EPSG:25830).
//!
//! This library provides tools for:
//! - Cleaning numeric fields with regional separator conventions and placeholders
//! - Recognizing the textual encoding of a field (DMS, NMEA, WKT, GeoJSON, glued digits, ...)
//! - Projecting geographic and legacy planar systems (ED50, Madrid datum, Lambert) to UTM30
//! - Repairing swapped, truncated and kilometer-scaled values with a full audit trail
//! - Scoring each result and classifying its confidence
//! - Sequential and concurrent batch normalization with aggregate statistics

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod crs_transform;
        pub mod encoding;
        pub mod format_parsers;
        pub mod lexer;
        pub mod normalizer;
        pub mod recognizer;
        pub mod rescue;
        pub mod scorer;
        pub mod structural;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    Confidence, CoordinateInput, Correction, CorrectionType, Flag, FlagType, NormalizationResult,
    RawValue, SourceCrs, SourceFormat,
};
pub use app::services::normalizer::{
    BatchStats, CoordinateNormalizer, get_batch_stats, normalize_coordinate,
    normalize_coordinate_batch, normalize_coordinate_batch_concurrent,
};
pub use config::NormalizerConfig;

/// Result type alias for the coordinate normalizer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the edges of the normalizer (configuration, batch tasks, CLI I/O)
///
/// The normalization engine itself never fails: malformed input is reported
/// through flags on the [`NormalizationResult`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON (de)serialization error
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// A batch input line could not be split into fields
    #[error("Input parsing error on line {line}: {message}")]
    InputParsing { line: usize, message: String },

    /// A concurrent batch worker failed
    #[error("Batch task error: {message}")]
    BatchTask { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create an input parsing error for a given line
    pub fn input_parsing(line: usize, message: impl Into<String>) -> Self {
        Self::InputParsing {
            line,
            message: message.into(),
        }
    }

    /// Create a batch task error
    pub fn batch_task(message: impl Into<String>) -> Self {
        Self::BatchTask {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}
