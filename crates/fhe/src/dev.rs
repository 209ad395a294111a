//! Development encryption capability.
//!
//! NOT cryptographically meaningful. Ciphertexts are random 32-byte handles
//! whose plaintexts live in an in-process table, and proofs are SHA-256
//! digests binding the inputs together. It lets the full upload and verify
//! workflow run locally against [`vault_chain::MemoryContract`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;
use vault_chain::{encode_clear_values, Handle};

use crate::error::EncryptionError;
use crate::traits::{EncryptionCapability, OnChainVerifier};
use crate::types::{DecryptionResult, EncryptedInput};

#[derive(Debug, Default)]
pub struct DevEncryption {
    initialized: AtomicBool,
    init_delay: Option<Duration>,
    failing_inits: AtomicUsize,
    plaintexts: Mutex<HashMap<Handle, u64>>,
    initialize_calls: AtomicUsize,
    encrypt_calls: AtomicUsize,
    decrypt_calls: AtomicUsize,
}

impl DevEncryption {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize` take `delay` before completing.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    /// Make the next `count` calls to `initialize` fail.
    pub fn fail_next_initializations(&self, count: usize) {
        self.failing_inits.store(count, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    fn require_initialized(&self) -> Result<(), EncryptionError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(EncryptionError::NotInitialized)
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<Handle, u64>> {
        self.plaintexts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn digest(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

#[async_trait]
impl EncryptionCapability for DevEncryption {
    async fn initialize(&self) -> Result<(), EncryptionError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_inits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(EncryptionError::Initialization(
                "public key fetch failed".to_string(),
            ));
        }

        self.initialized.store(true, Ordering::SeqCst);
        debug!("dev encryption initialized");
        Ok(())
    }

    async fn encrypt(
        &self,
        context_id: &str,
        user_id: &str,
        plaintext: u64,
    ) -> Result<EncryptedInput, EncryptionError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.require_initialized()?;

        let ciphertext: [u8; 32] = rand::random();
        let handle = Handle::from_bytes(&ciphertext);
        self.table().insert(handle.clone(), plaintext);
        debug!(%handle, context_id, "encrypted input");

        let proof = digest(&[context_id.as_bytes(), user_id.as_bytes(), &ciphertext]);
        Ok(EncryptedInput {
            ciphertext: ciphertext.to_vec(),
            proof,
        })
    }

    async fn decrypt_and_verify(
        &self,
        handles: &[Handle],
        context_id: &str,
        verifier: &dyn OnChainVerifier,
    ) -> Result<DecryptionResult, EncryptionError> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        self.require_initialized()?;

        let clear_values = {
            let table = self.table();
            handles
                .iter()
                .map(|h| {
                    table
                        .get(h)
                        .map(|v| (h.clone(), *v))
                        .ok_or_else(|| EncryptionError::UnknownHandle(h.clone()))
                })
                .collect::<Result<HashMap<_, _>, _>>()?
        };

        let ordered: Vec<u64> = handles.iter().map(|h| clear_values[h]).collect();
        let encoded = encode_clear_values(&ordered);
        let proof = digest(&[b"decrypt", context_id.as_bytes(), &encoded]);

        let tx = verifier.submit(&encoded, &proof).await?;
        let receipt = tx.wait().await?;
        debug!(hash = %receipt.hash, block = receipt.block, "decryption verified on-chain");

        Ok(DecryptionResult {
            clear_values,
            encoded,
            proof,
        })
    }
}
