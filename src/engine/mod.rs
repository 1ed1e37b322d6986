pub mod analyzer;
pub mod summary;

pub use analyzer::PatternEngine;
pub use summary::*;
