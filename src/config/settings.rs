use serde::{Deserialize, Serialize};

use crate::types::ModelKind;

pub const MIN_SIGNIFICANCE_THRESHOLD: u32 = 1;
pub const MAX_SIGNIFICANCE_THRESHOLD: u32 = 100;
pub const MIN_PATTERN_LENGTH: usize = 3;
pub const MAX_PATTERN_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Minimum observations before a statistic is trusted
    pub significance_threshold: u32,
    /// Longest pattern the pattern model tracks
    pub max_pattern_length: usize,
    pub active_model: ModelKind,
    /// Bulk loads above this size report progress
    pub progress_batch_threshold: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            significance_threshold: 5,
            max_pattern_length: 5,
            active_model: ModelKind::Pattern,
            progress_batch_threshold: 50,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(MIN_SIGNIFICANCE_THRESHOLD..=MAX_SIGNIFICANCE_THRESHOLD)
            .contains(&self.significance_threshold)
        {
            errors.push(format!(
                "significance_threshold must be between {} and {}",
                MIN_SIGNIFICANCE_THRESHOLD, MAX_SIGNIFICANCE_THRESHOLD
            ));
        }
        if !(MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH).contains(&self.max_pattern_length) {
            errors.push(format!(
                "max_pattern_length must be between {} and {}",
                MIN_PATTERN_LENGTH, MAX_PATTERN_LENGTH
            ));
        }
        if self.progress_batch_threshold == 0 {
            errors.push("progress_batch_threshold must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
