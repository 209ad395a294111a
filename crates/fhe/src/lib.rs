//! Encryption capability for the research vault.
//!
//! The workflow engine never touches ciphertext internals. It asks an
//! [`EncryptionCapability`] to encrypt a plaintext integer for a contract,
//! and to decrypt a set of handles and get the result verified on-chain
//! through an [`OnChainVerifier`] callback that the engine supplies.

mod dev;
mod error;
mod traits;
mod types;

pub use dev::DevEncryption;
pub use error::EncryptionError;
pub use traits::{EncryptionCapability, OnChainVerifier};
pub use types::{DecryptionResult, EncryptedInput};
