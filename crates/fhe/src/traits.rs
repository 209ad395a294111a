use async_trait::async_trait;
use vault_chain::{GatewayError, Handle, PendingTransaction};

use crate::error::EncryptionError;
use crate::types::{DecryptionResult, EncryptedInput};

/// Callback that submits a decryption proof for on-chain verification.
///
/// Supplied by the caller of [`EncryptionCapability::decrypt_and_verify`],
/// which knows which record and which signer the proof belongs to.
#[async_trait]
pub trait OnChainVerifier: Send + Sync {
    async fn submit(
        &self,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn PendingTransaction>, GatewayError>;
}

/// Client-side encryption engine.
///
/// Implementations may be slow: encryption and proof generation run on the
/// client.
#[async_trait]
pub trait EncryptionCapability: Send + Sync {
    /// Load key material and prepare the engine. May be called again after
    /// a failure.
    async fn initialize(&self) -> Result<(), EncryptionError>;

    /// Encrypt `plaintext` for the contract at `context_id` on behalf of `user_id`.
    async fn encrypt(
        &self,
        context_id: &str,
        user_id: &str,
        plaintext: u64,
    ) -> Result<EncryptedInput, EncryptionError>;

    /// Decrypt `handles`, hand the encoded clear values and proof to
    /// `verifier`, and wait for the verification transaction to be mined.
    async fn decrypt_and_verify(
        &self,
        handles: &[Handle],
        context_id: &str,
        verifier: &dyn OnChainVerifier,
    ) -> Result<DecryptionResult, EncryptionError>;
}
