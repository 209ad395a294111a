/// Revert reason the contract emits when a record is verified twice.
pub const ALREADY_VERIFIED_REASON: &str = "Data already verified";

/// Message wallets attach when the user declines to sign.
pub const USER_REJECTED_REASON: &str = "user rejected transaction";

/// All errors that can be returned by a contract gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The wallet owner declined to sign the transaction.
    #[error("user rejected transaction")]
    UserRejected,

    /// The record has already been verified on-chain.
    #[error("Data already verified: {id}")]
    AlreadyVerified { id: String },

    /// No record with the given identifier exists.
    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    /// A record with this identifier already exists.
    #[error("record already exists: {id}")]
    DuplicateRecord { id: String },

    /// The transaction was mined but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// RPC or provider failure (connection refused, malformed response, etc.).
    #[error("{0}")]
    Transport(String),
}

impl GatewayError {
    /// Whether this error means the user declined the signature.
    ///
    /// Providers do not always surface a typed rejection, so the message
    /// text of untyped errors is checked as well.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            GatewayError::UserRejected => true,
            GatewayError::Transport(msg) | GatewayError::Reverted(msg) => {
                msg.contains(USER_REJECTED_REASON)
            }
            _ => false,
        }
    }

    /// Whether this error means the record was already verified on-chain.
    pub fn is_already_verified(&self) -> bool {
        match self {
            GatewayError::AlreadyVerified { .. } => true,
            GatewayError::Transport(msg) | GatewayError::Reverted(msg) => {
                msg.contains(ALREADY_VERIFIED_REASON)
            }
            _ => false,
        }
    }
}
