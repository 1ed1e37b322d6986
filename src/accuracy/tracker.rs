use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Forecast, ModelKind, Outcome};

/// Loss streak length at which a miss is written to the loss-streak log
pub const LOSS_STREAK_LOG_MIN: u32 = 3;

/// A forecast paired with the outcome that actually followed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Sequence index of the realized outcome
    pub outcome_index: usize,
    pub predicted: Outcome,
    pub realized: Outcome,
    pub probability: f64,
    pub basis_label: String,
    pub model: ModelKind,
}

impl PredictionRecord {
    pub fn is_correct(&self) -> bool {
        self.predicted == self.realized
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyState {
    pub total_predictions: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub current_win_streak: u32,
    pub max_win_streak: u32,
    pub current_loss_streak: u32,
    pub max_loss_streak: u32,
}

impl AccuracyState {
    fn apply(&mut self, correct: bool) {
        self.total_predictions += 1;
        if correct {
            self.correct += 1;
            self.current_win_streak += 1;
            self.current_loss_streak = 0;
            self.max_win_streak = self.max_win_streak.max(self.current_win_streak);
        } else {
            self.incorrect += 1;
            self.current_loss_streak += 1;
            self.current_win_streak = 0;
            self.max_loss_streak = self.max_loss_streak.max(self.current_loss_streak);
        }
    }

    /// Percentage of correct predictions, 0 when none were made
    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64 * 100.0
        }
    }
}

/// A miss made while the prediction loss streak was 3 or longer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossStreakEntry {
    pub loss_streak: u32,
    pub basis_label: String,
    pub model: ModelKind,
    pub probability: f64,
}

/// Records forecasts against realized outcomes.
///
/// The state is always what replaying `records` from empty would produce.
#[derive(Debug, Clone, Default)]
pub struct AccuracyTracker {
    records: Vec<PredictionRecord>,
    state: AccuracyState,
    loss_streaks: Vec<LossStreakEntry>,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tracker by replaying `records` in order.
    pub fn replay(records: Vec<PredictionRecord>) -> Self {
        let mut tracker = Self::new();
        for record in records {
            tracker.push(record);
        }
        tracker
    }

    /// Record the forecast made for the outcome at `outcome_index`.
    pub fn record(&mut self, outcome_index: usize, forecast: &Forecast, realized: Outcome) {
        let record = PredictionRecord {
            outcome_index,
            predicted: forecast.target,
            realized,
            probability: forecast.probability,
            basis_label: forecast.basis_label.clone(),
            model: forecast.model,
        };
        debug!(
            "Prediction #{}: predicted {} got {} ({})",
            self.records.len() + 1,
            record.predicted,
            record.realized,
            if record.is_correct() { "hit" } else { "miss" }
        );
        self.push(record);
    }

    fn push(&mut self, record: PredictionRecord) {
        self.state.apply(record.is_correct());
        if self.state.current_loss_streak >= LOSS_STREAK_LOG_MIN {
            self.loss_streaks.push(LossStreakEntry {
                loss_streak: self.state.current_loss_streak,
                basis_label: record.basis_label.clone(),
                model: record.model,
                probability: record.probability,
            });
        }
        self.records.push(record);
    }

    /// Undo hook for the outcome at `outcome_index`. Pops the last record only
    /// when it belongs to that outcome, then rebuilds all derived state by
    /// replay. Returns the removed record.
    pub fn rollback(&mut self, outcome_index: usize) -> Option<PredictionRecord> {
        if self.records.last()?.outcome_index != outcome_index {
            return None;
        }
        let mut records = std::mem::take(&mut self.records);
        let removed = records.pop();
        *self = Self::replay(records);
        removed
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> &AccuracyState {
        &self.state
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn loss_streaks(&self) -> &[LossStreakEntry] {
        &self.loss_streaks
    }

    pub fn accuracy(&self) -> f64 {
        self.state.accuracy()
    }
}
