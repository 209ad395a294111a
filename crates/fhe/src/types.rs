use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vault_chain::Handle;

/// Ciphertext plus the proof that it was produced for a given contract and user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub ciphertext: Vec<u8>,
    pub proof: Vec<u8>,
}

/// Outcome of a decrypt-and-verify round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResult {
    /// Clear value for each requested handle.
    pub clear_values: HashMap<Handle, u64>,
    /// The ABI encoding of the clear values that was submitted on-chain.
    pub encoded: Vec<u8>,
    /// The decryption proof that was submitted on-chain.
    pub proof: Vec<u8>,
}
