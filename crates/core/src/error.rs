//! Errors raised by the turn engine.

use thiserror::Error;

/// Failures of engine operations.
///
/// Collaborator failures (settings and custom legend files) are reported
/// through `anyhow` by their own stores and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start_game` was given a configuration that cannot be played.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// An operation needs a started game and none is running.
    #[error("no active session")]
    NoActiveSession,
    /// A resolution arrived for a turn whose clock was already cancelled.
    #[error("turn clock was cancelled before the turn was resolved")]
    ExpiredAfterCancel,
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
