use thiserror::Error;

/// Errors surfaced when building or externally mutating a swarm.
///
/// Nothing inside a step returns an error: numerical degeneracies are
/// handled by skip guards in the interaction pass.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// A configuration value is outside its admissible range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An agent index addressed past the end of the swarm.
    #[error("agent index {index} out of range for swarm of {len}")]
    AgentIndexOutOfRange { index: usize, len: usize },
    /// A snapshot or trace frame does not match the swarm's population.
    #[error("expected {expected} agents, got {actual}")]
    AgentCountMismatch { expected: usize, actual: usize },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SwarmResult<T> = Result<T, SwarmError>;
