use serde::Serialize;
use std::fmt;

use crate::accuracy::AccuracyState;
use crate::models::PatternStats;
use crate::types::{Outcome, OutcomeSequence};

/// Consecutive identical outcomes at the end of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub outcome: Outcome,
    pub length: usize,
}

impl fmt::Display for Streak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.length, self.outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPattern {
    pub pattern: String,
    pub target: Outcome,
    pub probability: f64,
    pub samples: u32,
}

impl fmt::Display for BestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.pattern, self.target)
    }
}

/// Session statistics shown alongside the prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// Share of wins in percent
    pub win_rate: f64,
    pub current_streak: Option<Streak>,
    pub max_win_run: usize,
    pub max_loss_run: usize,
    pub predictions: u32,
    /// Share of correct predictions in percent
    pub accuracy: f64,
    pub best_pattern: Option<BestPattern>,
    pub accuracy_state: AccuracyState,
}

impl SessionSummary {
    pub fn build(
        sequence: &OutcomeSequence,
        patterns: &PatternStats,
        accuracy: &AccuracyState,
        threshold: u32,
    ) -> Self {
        let total = sequence.len();
        let wins = sequence.wins();
        let win_rate = if total > 0 {
            wins as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let (max_win_run, max_loss_run) = sequence.max_runs();

        let best_pattern = patterns
            .best_pattern(threshold)
            .map(|(pattern, stat)| BestPattern {
                pattern: pattern.to_string(),
                target: stat.favoured(),
                probability: stat.best_probability(),
                samples: stat.total,
            });

        Self {
            total,
            wins,
            losses: total - wins,
            win_rate,
            current_streak: sequence
                .current_run()
                .map(|(outcome, length)| Streak { outcome, length }),
            max_win_run,
            max_loss_run,
            predictions: accuracy.total_predictions,
            accuracy: accuracy.accuracy(),
            best_pattern,
            accuracy_state: *accuracy,
        }
    }

    pub fn current_streak_label(&self) -> String {
        self.current_streak
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn best_pattern_label(&self) -> String {
        self.best_pattern
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
