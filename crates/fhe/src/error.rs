use vault_chain::{GatewayError, Handle};

/// Errors returned by an encryption capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncryptionError {
    /// `initialize` has not completed successfully.
    #[error("encryption system not initialized")]
    NotInitialized,

    /// Key material or runtime could not be set up.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The capability has no ciphertext behind this handle.
    #[error("unknown encrypted handle {0}")]
    UnknownHandle(Handle),

    /// The on-chain verification callback failed.
    #[error(transparent)]
    Verification(#[from] GatewayError),
}

impl EncryptionError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, EncryptionError::Verification(e) if e.is_user_rejection())
    }

    /// Whether the failure means the record was verified by someone else first.
    pub fn is_already_verified(&self) -> bool {
        matches!(self, EncryptionError::Verification(e) if e.is_already_verified())
    }
}
