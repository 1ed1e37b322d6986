//! Win/Loss outcome sequence analysis.
//!
//! Keeps a chronological log of `W`/`L` outcomes, derives pattern, matrix
//! and adaptive trend statistics from it, forecasts the next outcome and
//! scores every forecast once the real outcome arrives.

pub mod accuracy;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod interactive;
pub mod models;
pub mod storage;
pub mod types;

pub use config::EngineSettings;
pub use engine::{PatternEngine, SessionSummary};
pub use error::{EngineError, EngineResult};
pub use storage::{FileStore, ResultStore};
pub use types::{Forecast, ModelKind, Outcome, OutcomeSequence};
