pub mod pattern;
pub mod matrix;
pub mod adaptive;
pub mod selector;

pub use pattern::PatternStats;
pub use matrix::{MatrixAxis, MatrixStats};
pub use adaptive::{AdaptiveStats, Trend, TrendStat};
pub use selector::{predict_next, select_best, ModelStats};
