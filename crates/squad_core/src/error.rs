use thiserror::Error;

use crate::models::CandidateId;

/// Errors surfaced by the optimizer.
///
/// "No feasible squad" is not an error: search and evaluation return empty
/// or `None` results for that case.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SquadError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid candidate {id}: {reason}")]
    InvalidCandidate { id: CandidateId, reason: String },

    #[error("Duplicate candidate id: {0}")]
    DuplicateCandidate(CandidateId),

    #[error("Unknown candidate id: {0}")]
    UnknownCandidate(CandidateId),

    #[error("Invalid squad: {0}")]
    InvalidSquad(String),

    /// Internally generated squad broke an invariant (programmer error).
    #[error("Invalid internal state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SquadError {
    /// Whether the caller can fix the input and retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SquadError::InvalidConfig(_) => true,
            SquadError::InvalidCandidate { .. } => true,
            SquadError::DuplicateCandidate(_) => true,
            SquadError::UnknownCandidate(_) => true,
            SquadError::InvalidSquad(_) => true,
            SquadError::Serialization(_) => true,
            SquadError::InvalidState(_) => false,
        }
    }

    /// Stable error code used by the JSON API (`"{code}: {message}"`).
    pub fn code(&self) -> &'static str {
        match self {
            SquadError::InvalidConfig(_) => "E_CONFIG",
            SquadError::InvalidCandidate { .. } => "E_CANDIDATE",
            SquadError::DuplicateCandidate(_) => "E_DUPLICATE",
            SquadError::UnknownCandidate(_) => "E_UNKNOWN",
            SquadError::InvalidSquad(_) => "E_SQUAD",
            SquadError::InvalidState(_) => "E_STATE",
            SquadError::Serialization(_) => "E_JSON",
        }
    }
}

impl From<serde_json::Error> for SquadError {
    fn from(err: serde_json::Error) -> Self {
        SquadError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SquadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_is_not_recoverable() {
        assert!(!SquadError::InvalidState("dup".into()).is_recoverable());
        assert!(SquadError::InvalidConfig("beam_width".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: SquadError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.code(), "E_JSON");
    }
}
