use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Outcome;

/// Prediction model selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Pattern,
    Matrix,
    Adaptive,
    Combined,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Pattern => "pattern",
            ModelKind::Matrix => "matrix",
            ModelKind::Adaptive => "adaptive",
            ModelKind::Combined => "combined",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Pattern => "Pattern Analysis",
            ModelKind::Matrix => "Matrix Analysis",
            ModelKind::Adaptive => "Adaptive Analysis",
            ModelKind::Combined => "Combined Analysis",
        }
    }

    pub fn all() -> [ModelKind; 4] {
        [
            ModelKind::Pattern,
            ModelKind::Matrix,
            ModelKind::Adaptive,
            ModelKind::Combined,
        ]
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pattern" => Ok(ModelKind::Pattern),
            "matrix" => Ok(ModelKind::Matrix),
            "adaptive" => Ok(ModelKind::Adaptive),
            "combined" => Ok(ModelKind::Combined),
            _ => Err(anyhow!("Unknown model: {}", s)),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single model's prediction for the next outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub target: Outcome,
    /// Confidence in percent, 0..=100
    pub probability: f64,
    /// Pattern, axis or trend that produced the forecast
    pub basis_label: String,
    pub sample_count: u32,
    pub model: ModelKind,
}

impl Forecast {
    pub fn new(
        model: ModelKind,
        target: Outcome,
        probability: f64,
        basis_label: impl Into<String>,
        sample_count: u32,
    ) -> Self {
        Self {
            target,
            probability,
            basis_label: basis_label.into(),
            sample_count,
            model,
        }
    }

    /// Strict (probability, sample_count) ordering used by the combined mode.
    pub fn outranks(&self, other: &Forecast) -> bool {
        self.probability > other.probability
            || (self.probability == other.probability && self.sample_count > other.sample_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        for kind in ModelKind::all() {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!("Combined".parse::<ModelKind>().unwrap(), ModelKind::Combined);
        assert!("markov".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_outranks() {
        let a = Forecast::new(ModelKind::Pattern, Outcome::Win, 70.0, "WW", 5);
        let b = Forecast::new(ModelKind::Matrix, Outcome::Loss, 70.0, "H1:LLLWL", 8);
        assert!(b.outranks(&a));
        assert!(!a.outranks(&b));
        assert!(!a.outranks(&a.clone()));
    }
}
