use thiserror::Error;

/// Errors reported by the engine facade. All of them leave the engine
/// state exactly as it was before the failing call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No results to remove")]
    EmptySequence,

    #[error("Invalid tokens {}: use only W and L", .tokens.join(", "))]
    InvalidToken { tokens: Vec<String> },

    #[error("No valid results found")]
    NoValidTokens,

    #[error("Storage failure at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {}", .0.join(", "))]
    InvalidSettings(Vec<String>),
}

pub type EngineResult<T> = Result<T, EngineError>;
