//! In-memory contract.
//!
//! Behaves like the deployed research data contract closely enough to drive
//! the workflow end to end without a chain: writes are applied when the
//! transaction is awaited, identifiers are unique, and a second verification
//! reverts. A few knobs let tests inject the failures a real provider can
//! produce.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::GatewayError;
use crate::record::{decode_clear_values, BusinessData, Handle, TxReceipt};
use crate::traits::{ContractConnector, ContractReader, ContractWriter, PendingTransaction};

#[derive(Debug, Clone)]
struct StoredRecord {
    data: BusinessData,
    handle: Handle,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order, which is what `getAllBusinessIds` returns.
    order: Vec<String>,
    records: HashMap<String, StoredRecord>,
    available: bool,
    signer: Option<String>,
    reject_signatures: bool,
    revert_next: Option<String>,
    failing_reads: HashSet<String>,
    enumeration_error: Option<String>,
    block: u64,
    tx_count: u64,
}

impl MemoryState {
    fn next_tx_hash(&mut self) -> String {
        self.tx_count += 1;
        format!("0x{:064x}", self.tx_count)
    }
}

/// An in-process research data contract.
///
/// Cloning yields another handle to the same contract state.
#[derive(Debug, Clone)]
pub struct MemoryContract {
    address: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryContract {
    /// Create an empty, available contract with no signer connected.
    pub fn new(address: impl Into<String>) -> Self {
        let state = MemoryState {
            available: true,
            ..MemoryState::default()
        };
        Self {
            address: address.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_state(&self.state)
    }

    /// Connect a wallet signer. Writes are attributed to this address.
    pub fn connect_signer(&self, address: impl Into<String>) {
        self.lock().signer = Some(address.into());
    }

    pub fn disconnect_signer(&self) {
        self.lock().signer = None;
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Make every subsequent signature request fail as if the user declined it.
    pub fn reject_signatures(&self, reject: bool) {
        self.lock().reject_signatures = reject;
    }

    /// Make the next awaited transaction revert with `reason`.
    pub fn revert_next_confirmation(&self, reason: impl Into<String>) {
        self.lock().revert_next = Some(reason.into());
    }

    /// Make `get_business_data` fail for one identifier.
    pub fn fail_reads_for(&self, id: impl Into<String>) {
        self.lock().failing_reads.insert(id.into());
    }

    /// Make `get_all_business_ids` fail with `message`, or restore it with `None`.
    pub fn fail_enumeration(&self, message: Option<String>) {
        self.lock().enumeration_error = message;
    }

    /// Verify a record out of band, as another party would.
    pub fn mark_verified(&self, id: &str, value: u64) -> Result<(), GatewayError> {
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| GatewayError::RecordNotFound { id: id.to_string() })?;
        if record.data.is_verified {
            return Err(GatewayError::AlreadyVerified { id: id.to_string() });
        }
        record.data.is_verified = true;
        record.data.decrypted_value = value;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    /// Current stored state of one record, bypassing read failure injection.
    pub fn peek(&self, id: &str) -> Option<BusinessData> {
        self.lock().records.get(id).map(|r| r.data.clone())
    }

    fn handle(&self, signer: Option<String>) -> Arc<MemoryHandle> {
        Arc::new(MemoryHandle {
            address: self.address.clone(),
            state: Arc::clone(&self.state),
            signer,
        })
    }
}

#[async_trait]
impl ContractConnector for MemoryContract {
    async fn read_only(&self) -> Option<Arc<dyn ContractReader>> {
        Some(self.handle(None))
    }

    async fn with_signer(&self) -> Option<Arc<dyn ContractWriter>> {
        let signer = self.lock().signer.clone()?;
        Some(self.handle(Some(signer)))
    }
}

fn lock_state(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    // Recover data even if the mutex was poisoned by a panicking test.
    state.lock().unwrap_or_else(|e| e.into_inner())
}

// ──────────────────────────────────────────────
// Contract handle
// ──────────────────────────────────────────────

struct MemoryHandle {
    address: String,
    state: Arc<Mutex<MemoryState>>,
    signer: Option<String>,
}

impl MemoryHandle {
    fn signer(&self) -> Result<&str, GatewayError> {
        self.signer
            .as_deref()
            .ok_or_else(|| GatewayError::Transport("no signer attached".to_string()))
    }
}

#[async_trait]
impl ContractReader for MemoryHandle {
    async fn address(&self) -> Result<String, GatewayError> {
        Ok(self.address.clone())
    }

    async fn get_all_business_ids(&self) -> Result<Vec<String>, GatewayError> {
        let state = lock_state(&self.state);
        if let Some(msg) = &state.enumeration_error {
            return Err(GatewayError::Transport(msg.clone()));
        }
        Ok(state.order.clone())
    }

    async fn get_business_data(&self, id: &str) -> Result<BusinessData, GatewayError> {
        let state = lock_state(&self.state);
        if state.failing_reads.contains(id) {
            return Err(GatewayError::Transport(format!("read failed for {id}")));
        }
        state
            .records
            .get(id)
            .map(|r| r.data.clone())
            .ok_or_else(|| GatewayError::RecordNotFound { id: id.to_string() })
    }

    async fn get_encrypted_value(&self, id: &str) -> Result<Handle, GatewayError> {
        lock_state(&self.state)
            .records
            .get(id)
            .map(|r| r.handle.clone())
            .ok_or_else(|| GatewayError::RecordNotFound { id: id.to_string() })
    }

    async fn is_available(&self) -> Result<bool, GatewayError> {
        Ok(lock_state(&self.state).available)
    }
}

#[async_trait]
impl ContractWriter for MemoryHandle {
    async fn create_business_data(
        &self,
        id: &str,
        name: &str,
        ciphertext: &[u8],
        proof: &[u8],
        confidence: u32,
        reserved: u32,
        description: &str,
    ) -> Result<Box<dyn PendingTransaction>, GatewayError> {
        let creator = self.signer()?.to_string();
        let mut state = lock_state(&self.state);
        if state.reject_signatures {
            return Err(GatewayError::UserRejected);
        }
        if state.records.contains_key(id) {
            return Err(GatewayError::DuplicateRecord { id: id.to_string() });
        }
        if proof.is_empty() {
            return Err(GatewayError::Reverted("invalid input proof".to_string()));
        }

        let timestamp = u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(0);
        let record = StoredRecord {
            data: BusinessData {
                name: name.to_string(),
                description: description.to_string(),
                public_value1: confidence,
                public_value2: reserved,
                timestamp,
                creator,
                is_verified: false,
                decrypted_value: 0,
            },
            handle: Handle::from_bytes(ciphertext),
        };
        let hash = state.next_tx_hash();
        debug!(%hash, id, "create submitted");

        Ok(Box::new(MemoryTx {
            hash,
            state: Arc::clone(&self.state),
            effect: Effect::Create {
                id: id.to_string(),
                record,
            },
        }))
    }

    async fn verify_decryption(
        &self,
        id: &str,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn PendingTransaction>, GatewayError> {
        self.signer()?;
        let mut state = lock_state(&self.state);
        if state.reject_signatures {
            return Err(GatewayError::UserRejected);
        }
        let record = state
            .records
            .get(id)
            .ok_or_else(|| GatewayError::RecordNotFound { id: id.to_string() })?;
        if record.data.is_verified {
            return Err(GatewayError::AlreadyVerified { id: id.to_string() });
        }
        if proof.is_empty() {
            return Err(GatewayError::Reverted("invalid decryption proof".to_string()));
        }
        let value = decode_clear_values(clear_values)?
            .first()
            .copied()
            .ok_or_else(|| GatewayError::Reverted("no clear value supplied".to_string()))?;

        let hash = state.next_tx_hash();
        debug!(%hash, id, "verification submitted");

        Ok(Box::new(MemoryTx {
            hash,
            state: Arc::clone(&self.state),
            effect: Effect::Verify {
                id: id.to_string(),
                value,
            },
        }))
    }
}

// ──────────────────────────────────────────────
// Transactions
// ──────────────────────────────────────────────

enum Effect {
    Create { id: String, record: StoredRecord },
    Verify { id: String, value: u64 },
}

struct MemoryTx {
    hash: String,
    state: Arc<Mutex<MemoryState>>,
    effect: Effect,
}

#[async_trait]
impl PendingTransaction for MemoryTx {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn wait(self: Box<Self>) -> Result<TxReceipt, GatewayError> {
        let MemoryTx {
            hash,
            state,
            effect,
        } = *self;
        let mut state = lock_state(&state);

        if let Some(reason) = state.revert_next.take() {
            return Err(GatewayError::Reverted(reason));
        }

        // Re-check at mining time: another transaction may have landed first.
        match effect {
            Effect::Create { id, record } => {
                if state.records.contains_key(&id) {
                    return Err(GatewayError::DuplicateRecord { id });
                }
                state.order.push(id.clone());
                state.records.insert(id, record);
            }
            Effect::Verify { id, value } => {
                let record = state
                    .records
                    .get_mut(&id)
                    .ok_or_else(|| GatewayError::RecordNotFound { id: id.clone() })?;
                if record.data.is_verified {
                    return Err(GatewayError::AlreadyVerified { id });
                }
                record.data.is_verified = true;
                record.data.decrypted_value = value;
            }
        }

        state.block += 1;
        Ok(TxReceipt {
            hash,
            block: state.block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::encode_clear_values;

    const ADDRESS: &str = "0x00000000000000000000000000000000000c0ffe";

    fn contract_with_signer() -> MemoryContract {
        let contract = MemoryContract::new(ADDRESS);
        contract.connect_signer("0xabc");
        contract
    }

    async fn create(contract: &MemoryContract, id: &str) {
        let writer = contract.with_signer().await.unwrap();
        let tx = writer
            .create_business_data(id, "Trial A", &[7u8; 32], b"proof", 8, 0, "pilot")
            .await
            .unwrap();
        tx.wait().await.unwrap();
    }

    #[tokio::test]
    async fn no_signer_means_no_writer() {
        let contract = MemoryContract::new(ADDRESS);
        assert!(contract.with_signer().await.is_none());
        assert!(contract.read_only().await.is_some());
    }

    #[tokio::test]
    async fn create_is_applied_on_confirmation() {
        let contract = contract_with_signer();
        let writer = contract.with_signer().await.unwrap();
        let tx = writer
            .create_business_data("r-1", "Trial A", &[7u8; 32], b"proof", 8, 0, "pilot")
            .await
            .unwrap();
        assert_eq!(contract.record_count(), 0);

        let receipt = tx.wait().await.unwrap();
        assert_eq!(receipt.block, 1);
        let data = contract.peek("r-1").unwrap();
        assert_eq!(data.name, "Trial A");
        assert_eq!(data.public_value1, 8);
        assert_eq!(data.creator, "0xabc");
        assert!(!data.is_verified);
    }

    #[tokio::test]
    async fn revert_leaves_state_untouched() {
        let contract = contract_with_signer();
        contract.revert_next_confirmation("out of gas");
        let writer = contract.with_signer().await.unwrap();
        let tx = writer
            .create_business_data("r-1", "Trial A", &[7u8; 32], b"proof", 8, 0, "")
            .await
            .unwrap();
        let err = tx.wait().await.unwrap_err();
        assert_eq!(err, GatewayError::Reverted("out of gas".to_string()));
        assert_eq!(contract.record_count(), 0);
    }

    #[tokio::test]
    async fn rejected_signature_is_typed() {
        let contract = contract_with_signer();
        contract.reject_signatures(true);
        let writer = contract.with_signer().await.unwrap();
        let err = writer
            .create_business_data("r-1", "x", &[1u8; 32], b"proof", 1, 0, "")
            .await
            .err()
            .unwrap();
        assert!(err.is_user_rejection());
    }

    #[tokio::test]
    async fn second_verification_reverts() {
        let contract = contract_with_signer();
        create(&contract, "r-1").await;
        let writer = contract.with_signer().await.unwrap();

        let encoded = encode_clear_values(&[42]);
        let tx = writer.verify_decryption("r-1", &encoded, b"p").await.unwrap();
        tx.wait().await.unwrap();
        assert_eq!(contract.peek("r-1").unwrap().decrypted_value, 42);

        let err = writer
            .verify_decryption("r-1", &encoded, b"p")
            .await
            .err()
            .unwrap();
        assert!(err.is_already_verified());
    }

    #[tokio::test]
    async fn read_failures_are_per_record() {
        let contract = contract_with_signer();
        create(&contract, "r-1").await;
        create(&contract, "r-2").await;
        contract.fail_reads_for("r-1");

        let reader = contract.read_only().await.unwrap();
        assert_eq!(
            reader.get_all_business_ids().await.unwrap(),
            vec!["r-1".to_string(), "r-2".to_string()]
        );
        assert!(reader.get_business_data("r-1").await.is_err());
        assert!(reader.get_business_data("r-2").await.is_ok());
    }

    #[tokio::test]
    async fn handle_is_derived_from_ciphertext() {
        let contract = contract_with_signer();
        create(&contract, "r-1").await;
        let reader = contract.read_only().await.unwrap();
        assert_eq!(
            reader.get_encrypted_value("r-1").await.unwrap(),
            Handle::from_bytes(&[7u8; 32])
        );
    }
}
