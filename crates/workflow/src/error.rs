use std::time::Duration;

use vault_chain::{GatewayError, Handle};
use vault_fhe::EncryptionError;

/// Why an upload form was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("research name is required")]
    MissingName,
    #[error("data value is required")]
    MissingValue,
    #[error("data value must be a non-negative integer")]
    InvalidValue,
    #[error("confidence score is required")]
    MissingConfidence,
    #[error("confidence score must be an integer from 1 to 10")]
    ConfidenceOutOfRange,
}

/// All errors produced by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("please connect wallet first")]
    NotConnected,

    #[error("encryption system not initialized")]
    NotInitialized,

    #[error(transparent)]
    InvalidForm(#[from] FormError),

    /// No contract handle could be obtained.
    #[error("contract connection failed")]
    ContractUnavailable,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("no clear value returned for handle {0}")]
    MissingClearValue(Handle),

    /// The wallet disconnected or switched accounts mid-operation.
    #[error("session changed while the operation was in flight")]
    SessionChanged,
}

impl WorkflowError {
    /// Refused before any network call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WorkflowError::NotConnected | WorkflowError::NotInitialized | WorkflowError::InvalidForm(_)
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        match self {
            WorkflowError::Gateway(e) => e.is_user_rejection(),
            WorkflowError::Encryption(e) => e.is_user_rejection(),
            _ => false,
        }
    }

    pub fn is_already_verified(&self) -> bool {
        match self {
            WorkflowError::Gateway(e) => e.is_already_verified(),
            WorkflowError::Encryption(e) => e.is_already_verified(),
            _ => false,
        }
    }

    /// The underlying message, or a generic fallback when there is none.
    pub fn detail(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            "unknown error".to_string()
        } else {
            msg
        }
    }
}
