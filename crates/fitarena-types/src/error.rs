//! Error types for FitArena
//!
//! The taxonomy follows the engine's contract: validation errors are
//! rejected before any I/O, state conflicts are explicit, and degraded
//! activity-provider conditions are *data* (typed outcomes), never errors.
//! Only store and minting failures are dependency-fatal.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ChallengeId, ChallengeStatus};

/// Result type for FitArena operations
pub type Result<T> = std::result::Result<T, ArenaError>;

/// FitArena error types
#[derive(Debug, Clone, Error)]
pub enum ArenaError {
    // ========================================================================
    // Validation Errors (rejected before any I/O)
    // ========================================================================

    /// Malformed participant identifier
    #[error("Invalid account '{input}': {reason}")]
    InvalidAccount { input: String, reason: String },

    /// Non-positive stake
    #[error("Invalid stake: must be positive, got {provided}")]
    InvalidStake { provided: Decimal },

    /// Generic malformed input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Free-text activity kind that maps to no canonical kind
    #[error("Unknown activity kind '{input}'")]
    UnknownActivityKind { input: String },

    // ========================================================================
    // Not Found
    // ========================================================================

    /// Unknown challenge id
    #[error("Challenge {challenge_id} not found")]
    ChallengeNotFound { challenge_id: ChallengeId },

    // ========================================================================
    // State Conflicts
    // ========================================================================

    /// Backward or unknown status move
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: ChallengeStatus,
        to: ChallengeStatus,
    },

    /// Operation requires a payout-ready challenge
    #[error("Challenge {challenge_id} is not claimable in status {status}")]
    NotClaimable {
        challenge_id: ChallengeId,
        status: ChallengeStatus,
    },

    /// Challenge has no usable start time
    #[error("Challenge {challenge_id} has no usable start time")]
    WindowUnresolvable { challenge_id: ChallengeId },

    /// Caller is not a participant of the challenge
    #[error("Account {account} is not a participant of challenge {challenge_id}")]
    NotParticipant {
        account: String,
        challenge_id: ChallengeId,
    },

    /// Caller is a participant but not the winner
    #[error("Account {account} is not the winner of challenge {challenge_id}")]
    NotWinner {
        account: String,
        challenge_id: ChallengeId,
    },

    /// This side already collected its payout
    #[error("Account {account} has already claimed challenge {challenge_id}")]
    AlreadyClaimed {
        account: String,
        challenge_id: ChallengeId,
    },

    /// Another resolution or claim holds the per-challenge lock
    #[error("Another operation is in progress for challenge {challenge_id}")]
    OperationInProgress { challenge_id: ChallengeId },

    // ========================================================================
    // Dependency Failures (fatal; no partial mutation assumed committed)
    // ========================================================================

    /// Challenge store failure
    #[error("Challenge store failure: {message}")]
    StoreFailure { message: String },

    /// Minting ledger failure
    #[error("Mint failure: {message}")]
    MintFailure { message: String },

    /// Activity provider transport failure
    #[error("Activity provider failure: {message}")]
    ProviderFailure { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ArenaError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a store failure
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreFailure {
            message: message.into(),
        }
    }

    /// Create a mint failure
    pub fn mint(message: impl Into<String>) -> Self {
        Self::MintFailure {
            message: message.into(),
        }
    }

    /// Whether a caller-level retry of the whole operation may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::StoreFailure { .. }
                | Self::MintFailure { .. }
                | Self::ProviderFailure { .. }
                | Self::OperationInProgress { .. }
                | Self::Internal { .. }
        )
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAccount { .. } => "INVALID_ACCOUNT",
            Self::InvalidStake { .. } => "INVALID_STAKE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::UnknownActivityKind { .. } => "UNKNOWN_ACTIVITY_KIND",
            Self::ChallengeNotFound { .. } => "CHALLENGE_NOT_FOUND",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::NotClaimable { .. } => "NOT_CLAIMABLE",
            Self::WindowUnresolvable { .. } => "WINDOW_UNRESOLVABLE",
            Self::NotParticipant { .. } => "NOT_PARTICIPANT",
            Self::NotWinner { .. } => "NOT_WINNER",
            Self::AlreadyClaimed { .. } => "ALREADY_CLAIMED",
            Self::OperationInProgress { .. } => "OPERATION_IN_PROGRESS",
            Self::StoreFailure { .. } => "STORE_FAILURE",
            Self::MintFailure { .. } => "MINT_FAILURE",
            Self::ProviderFailure { .. } => "PROVIDER_FAILURE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ArenaError::AlreadyClaimed {
            account: "0xabc".to_string(),
            challenge_id: ChallengeId::new(),
        };
        assert_eq!(err.error_code(), "ALREADY_CLAIMED");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(ArenaError::internal("boom").is_retriable());
        assert!(ArenaError::store("down").is_retriable());

        let conflict = ArenaError::NotClaimable {
            challenge_id: ChallengeId::new(),
            status: ChallengeStatus::Matched,
        };
        assert!(!conflict.is_retriable());
    }
}
