//! Coordinate normalization engine
//!
//! This module ties the services together behind the public contract:
//!
//! - [`normalize_coordinate`] - one input in, one [`NormalizationResult`] out
//! - [`normalize_coordinate_batch`] - an ordered batch with an optional progress callback
//! - [`normalize_coordinate_batch_concurrent`] - the same batch split across blocking workers
//! - [`get_batch_stats`] - aggregate counts over a set of results
//!
//! # Architecture
//!
//! - [`pipeline`] - the staged normalization of a single input
//! - [`stats`] - batch aggregation
//!
//! The engine holds no mutable state. Pattern tables are compiled once and
//! shared read-only, so a [`CoordinateNormalizer`] can be cloned into as many
//! workers as needed; results come back in input order either way.
//!
//! # Example Usage
//!
//! ```rust
//! use ptel_coords::{CoordinateInput, CoordinateNormalizer, NormalizerConfig};
//!
//! let normalizer = CoordinateNormalizer::new(NormalizerConfig::default());
//! let result = normalizer.normalize(&CoordinateInput::new("504 750´´92", "4 077 153´´36"));
//!
//! assert_eq!(result.coordinates(), Some((504750.92, 4077153.36)));
//! assert!(result.is_valid);
//! ```

mod pipeline;
pub mod stats;

#[cfg(test)]
mod tests;

pub use stats::BatchStats;

use crate::app::models::{CoordinateInput, NormalizationResult};
use crate::app::services::encoding::{BasicEncodingCorrector, EncodingCorrector};
use crate::config::NormalizerConfig;
use crate::constants::MIN_BATCH_CHUNK_SIZE;
use crate::{Error, Result};
use futures::future::join_all;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task;
use tracing::{debug, info};

/// Normalizer with its configuration and encoding collaborator
#[derive(Clone)]
pub struct CoordinateNormalizer {
    config: Arc<NormalizerConfig>,
    encoding_corrector: Arc<dyn EncodingCorrector>,
}

impl std::fmt::Debug for CoordinateNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateNormalizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CoordinateNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl CoordinateNormalizer {
    /// Create a normalizer using the built-in encoding corrector
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config: Arc::new(config),
            encoding_corrector: Arc::new(BasicEncodingCorrector),
        }
    }

    /// Replace the encoding corrector with an external service
    pub fn with_encoding_corrector(mut self, corrector: Arc<dyn EncodingCorrector>) -> Self {
        self.encoding_corrector = corrector;
        self
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one input; never fails
    pub fn normalize(&self, input: &CoordinateInput) -> NormalizationResult {
        pipeline::run(input, &self.config, self.encoding_corrector.as_ref())
    }

    /// Normalize a batch in order
    ///
    /// `on_progress` is called after every item with `(done, total)`.
    pub fn normalize_batch(
        &self,
        inputs: &[CoordinateInput],
        mut on_progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Vec<NormalizationResult> {
        let total = inputs.len();
        info!("Normalizing batch of {} coordinates", total);

        let results: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let result = self.normalize(input);
                if let Some(callback) = on_progress.as_deref_mut() {
                    callback(index + 1, total);
                }
                result
            })
            .collect();

        info!("{}", BatchStats::from_results(&results).summary());
        results
    }

    /// Normalize a batch across blocking worker tasks, keeping input order
    ///
    /// The batch is split into at most `config.workers` chunks of at least
    /// [`MIN_BATCH_CHUNK_SIZE`] items. `progress`, when given, is incremented
    /// once per finished item and can be polled from another task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchTask`] if a worker task panics or is cancelled
    pub async fn normalize_batch_concurrent(
        &self,
        inputs: Vec<CoordinateInput>,
        progress: Option<Arc<AtomicUsize>>,
    ) -> Result<Vec<NormalizationResult>> {
        let total = inputs.len();
        let workers = self.config.workers.max(1);
        let chunk_size = total.div_ceil(workers).max(MIN_BATCH_CHUNK_SIZE);
        info!(
            "Normalizing batch of {} coordinates concurrently ({} per chunk, {} workers)",
            total, chunk_size, workers
        );

        let mut chunks = Vec::new();
        let mut remaining = inputs.into_iter().peekable();
        while remaining.peek().is_some() {
            chunks.push(remaining.by_ref().take(chunk_size).collect::<Vec<_>>());
        }

        let handles = chunks.into_iter().enumerate().map(|(chunk_index, chunk)| {
            let normalizer = self.clone();
            let progress = progress.clone();
            task::spawn_blocking(move || {
                debug!("Chunk {} normalizing {} inputs", chunk_index, chunk.len());
                chunk
                    .iter()
                    .map(|input| {
                        let result = normalizer.normalize(input);
                        if let Some(counter) = &progress {
                            counter.fetch_add(1, Ordering::Relaxed);
                        }
                        result
                    })
                    .collect::<Vec<_>>()
            })
        });

        let mut results = Vec::with_capacity(total);
        for (chunk_index, joined) in join_all(handles).await.into_iter().enumerate() {
            let chunk_results = joined.map_err(|e| {
                Error::batch_task(format!("Chunk {} failed: {}", chunk_index, e))
            })?;
            results.extend(chunk_results);
        }

        info!("{}", BatchStats::from_results(&results).summary());
        Ok(results)
    }
}

static DEFAULT_NORMALIZER: Lazy<CoordinateNormalizer> = Lazy::new(CoordinateNormalizer::default);

/// Normalize one input with the default configuration
pub fn normalize_coordinate(input: &CoordinateInput) -> NormalizationResult {
    DEFAULT_NORMALIZER.normalize(input)
}

/// Normalize a batch in order with the default configuration
pub fn normalize_coordinate_batch(
    inputs: &[CoordinateInput],
    on_progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Vec<NormalizationResult> {
    DEFAULT_NORMALIZER.normalize_batch(inputs, on_progress)
}

/// Normalize a batch concurrently with the default configuration
pub async fn normalize_coordinate_batch_concurrent(
    inputs: Vec<CoordinateInput>,
) -> Result<Vec<NormalizationResult>> {
    DEFAULT_NORMALIZER
        .normalize_batch_concurrent(inputs, None)
        .await
}

/// Aggregate counts by confidence, format, correction and flag type
pub fn get_batch_stats(results: &[NormalizationResult]) -> BatchStats {
    BatchStats::from_results(results)
}
