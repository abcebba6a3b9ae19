//! Error kinds surfaced across the core/collaborator boundary.
//!
//! `MalformedInput`, `UnknownReference` and `CountMismatch` are raised by
//! whatever loads the static/dynamic inputs into a [`crate::model::Domain`]
//! (XML decoding itself lives in the `throng-cli` crate, which wraps these
//! in its own `anyhow::Error`). `NumericAnomaly` and `ContactInputCorrupt`
//! are raised by the core itself, during stepping and during history load.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required tag/attribute is missing, or a coordinate string does not
    /// parse as two comma-separated floats.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A material or agent identifier referenced from another file was never
    /// declared.
    #[error("unknown reference: {0}")]
    UnknownReference(String),

    /// The Dynamics file does not name the same agent set as the Agents
    /// file.
    #[error("agent count/identity mismatch: {0}")]
    CountMismatch(String),

    /// A NaN or non-finite value appeared in an accumulator during
    /// stepping. Fatal: the call aborts and leaves domain state unmodified.
    #[error("numeric anomaly: {0}")]
    NumericAnomaly(String),
}

/// Raised while loading the persistent AgentInteractions history. Unlike
/// [`CoreError`], this is recoverable: the caller logs it and proceeds with
/// an empty history store.
#[derive(Debug)]
pub struct ContactInputCorrupt(pub String);

impl fmt::Display for ContactInputCorrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contact input corrupt: {}", self.0)
    }
}

impl std::error::Error for ContactInputCorrupt {}

pub type CoreResult<T> = Result<T, CoreError>;
