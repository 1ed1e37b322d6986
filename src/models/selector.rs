use tracing::debug;

use super::adaptive::{self, AdaptiveStats};
use super::matrix::{self, MatrixStats};
use super::pattern::{self, PatternStats, MIN_PATTERN_HISTORY};
use crate::config::EngineSettings;
use crate::types::{Forecast, ModelKind, Outcome};

/// Cached statistics of all three models for one sequence snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStats {
    pub pattern: PatternStats,
    pub matrix: MatrixStats,
    pub adaptive: AdaptiveStats,
}

impl ModelStats {
    /// Full recompute from the sequence; nothing carries over between calls.
    pub fn analyze(sequence: &[Outcome], settings: &EngineSettings) -> Self {
        Self {
            pattern: pattern::analyze(sequence, settings.max_pattern_length),
            matrix: matrix::analyze(sequence),
            adaptive: adaptive::analyze(sequence, settings.significance_threshold),
        }
    }
}

/// Forecast for the outcome following `sequence` from the chosen model.
pub fn predict_next(
    sequence: &[Outcome],
    stats: &ModelStats,
    settings: &EngineSettings,
    kind: ModelKind,
) -> Option<Forecast> {
    if sequence.len() < MIN_PATTERN_HISTORY {
        return None;
    }

    let threshold = settings.significance_threshold;
    let forecast = match kind {
        ModelKind::Pattern => {
            pattern::predict(sequence, &stats.pattern, settings.max_pattern_length, threshold)
        }
        ModelKind::Matrix => matrix::predict(sequence, &stats.matrix, threshold),
        ModelKind::Adaptive => {
            adaptive::predict(sequence, &stats.pattern, &stats.adaptive, threshold)
        }
        ModelKind::Combined => select_best([
            pattern::predict(sequence, &stats.pattern, settings.max_pattern_length, threshold),
            matrix::predict(sequence, &stats.matrix, threshold),
            adaptive::predict(sequence, &stats.pattern, &stats.adaptive, threshold),
        ]),
    };

    if let Some(f) = &forecast {
        debug!(
            "{} forecast: {} ({:.1}%, {} samples, basis {})",
            kind, f.target, f.probability, f.sample_count, f.basis_label
        );
    }

    forecast
}

/// First forecast maximising (probability, sample_count); `None`s are skipped.
pub fn select_best<I>(candidates: I) -> Option<Forecast>
where
    I: IntoIterator<Item = Option<Forecast>>,
{
    candidates
        .into_iter()
        .flatten()
        .fold(None, |best: Option<Forecast>, candidate| match best {
            Some(current) if !candidate.outranks(&current) => Some(current),
            _ => Some(candidate),
        })
}
