//! Aggregate statistics over a batch of normalization results

use crate::app::models::{
    Confidence, CorrectionType, FlagType, NormalizationResult, SourceFormat,
};
use serde::Serialize;
use std::collections::HashMap;

/// Counts gathered from a batch of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    /// Number of results examined
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Inputs that were placeholders rather than values
    pub placeholders: usize,
    /// Inputs handed to an external geocoder (cadastral reference or place name)
    pub needs_geocoding: usize,
    /// Results where a rescue rule produced a value
    pub heuristic_rescues: usize,
    pub by_confidence: HashMap<Confidence, usize>,
    pub by_format: HashMap<SourceFormat, usize>,
    /// Number of corrections of each type across the batch
    pub by_correction: HashMap<CorrectionType, usize>,
    pub by_flag: HashMap<FlagType, usize>,
    /// Mean score over all results
    pub average_score: f64,
}

impl BatchStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self {
            total: 0,
            valid: 0,
            invalid: 0,
            placeholders: 0,
            needs_geocoding: 0,
            heuristic_rescues: 0,
            by_confidence: HashMap::new(),
            by_format: HashMap::new(),
            by_correction: HashMap::new(),
            by_flag: HashMap::new(),
            average_score: 0.0,
        }
    }

    /// Aggregate a slice of results
    pub fn from_results(results: &[NormalizationResult]) -> Self {
        let mut stats = Self::new();
        let mut score_sum: u64 = 0;

        for result in results {
            stats.total += 1;
            score_sum += u64::from(result.score);

            if result.is_valid {
                stats.valid += 1;
            } else {
                stats.invalid += 1;
            }
            if result.has_correction(CorrectionType::PlaceholderDetected) {
                stats.placeholders += 1;
            }
            if result.needs_geocoding() {
                stats.needs_geocoding += 1;
            }
            if result.heuristic_applied.is_some() {
                stats.heuristic_rescues += 1;
            }

            *stats.by_confidence.entry(result.confidence).or_insert(0) += 1;
            if let Some(format) = result.source_format {
                *stats.by_format.entry(format).or_insert(0) += 1;
            }
            for correction in &result.corrections {
                *stats
                    .by_correction
                    .entry(correction.correction_type)
                    .or_insert(0) += 1;
            }
            for flag in &result.flags {
                *stats.by_flag.entry(flag.flag_type).or_insert(0) += 1;
            }
        }

        if stats.total > 0 {
            stats.average_score = score_sum as f64 / stats.total as f64;
        }
        stats
    }

    /// Number of results in a confidence bucket
    pub fn confidence_count(&self, confidence: Confidence) -> usize {
        self.by_confidence.get(&confidence).copied().unwrap_or(0)
    }

    /// Number of corrections of a type
    pub fn correction_count(&self, correction_type: CorrectionType) -> usize {
        self.by_correction.get(&correction_type).copied().unwrap_or(0)
    }

    /// Percentage of valid results
    pub fn valid_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.valid as f64 / self.total as f64) * 100.0
        }
    }

    /// One-line summary of the batch
    pub fn summary(&self) -> String {
        format!(
            "Batch Summary: {} coordinates, {} valid ({:.1}%) | \
             HIGH {} / MEDIUM {} / LOW {} / CRITICAL {} | \
             Placeholders: {} | Geocoding: {} | Rescued: {} | Avg score: {:.1}",
            self.total,
            self.valid,
            self.valid_rate(),
            self.confidence_count(Confidence::High),
            self.confidence_count(Confidence::Medium),
            self.confidence_count(Confidence::Low),
            self.confidence_count(Confidence::Critical),
            self.placeholders,
            self.needs_geocoding,
            self.heuristic_rescues,
            self.average_score
        )
    }
}

impl Default for BatchStats {
    fn default() -> Self {
        Self::new()
    }
}
