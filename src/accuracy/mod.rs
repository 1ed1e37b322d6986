pub mod tracker;

pub use tracker::{AccuracyState, AccuracyTracker, LossStreakEntry, PredictionRecord};
