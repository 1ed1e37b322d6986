use serde::{Deserialize, Serialize};

use super::Outcome;

/// Win/loss counts with derived percentages.
///
/// `win_prob + loss_prob == 100` whenever `total > 0`; both are 0 otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionStat {
    pub win_count: u32,
    pub loss_count: u32,
    pub total: u32,
    pub win_prob: f64,
    pub loss_prob: f64,
}

impl TransitionStat {
    pub fn from_counts(win_count: u32, loss_count: u32) -> Self {
        let total = win_count + loss_count;
        let (win_prob, loss_prob) = if total > 0 {
            (
                win_count as f64 / total as f64 * 100.0,
                loss_count as f64 / total as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            win_count,
            loss_count,
            total,
            win_prob,
            loss_prob,
        }
    }

    /// Share of each symbol inside a fixed slice of outcomes.
    pub fn composition(outcomes: &[Outcome]) -> Self {
        let wins = outcomes.iter().filter(|o| o.is_win()).count() as u32;
        Self::from_counts(wins, outcomes.len() as u32 - wins)
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => *self = Self::from_counts(self.win_count + 1, self.loss_count),
            Outcome::Loss => *self = Self::from_counts(self.win_count, self.loss_count + 1),
        }
    }

    pub fn best_probability(&self) -> f64 {
        self.win_prob.max(self.loss_prob)
    }

    /// Outcome with the higher probability; a tie favours Loss.
    pub fn favoured(&self) -> Outcome {
        if self.win_prob > self.loss_prob {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    pub fn is_significant(&self, threshold: u32) -> bool {
        self.total >= threshold
    }
}
