use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::record::{BusinessData, Handle, TxReceipt};

/// A submitted transaction that can be awaited until it is mined.
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    /// Transaction hash as reported by the provider at submission time.
    fn hash(&self) -> &str;

    /// Wait for the transaction to be mined.
    ///
    /// Returns `Err(GatewayError::Reverted)` if the transaction was mined
    /// but reverted.
    async fn wait(self: Box<Self>) -> Result<TxReceipt, GatewayError>;
}

/// Read-only calls against the deployed research data contract.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` so a handle can be shared across
/// async task boundaries.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Address of the deployed contract. Used as the encryption context id.
    async fn address(&self) -> Result<String, GatewayError>;

    /// Identifiers of every stored record.
    async fn get_all_business_ids(&self) -> Result<Vec<String>, GatewayError>;

    /// Fetch one record.
    ///
    /// Returns `Err(GatewayError::RecordNotFound)` if the record does not exist.
    async fn get_business_data(&self, id: &str) -> Result<BusinessData, GatewayError>;

    /// Fetch the opaque handle of a record's encrypted value.
    async fn get_encrypted_value(&self, id: &str) -> Result<Handle, GatewayError>;

    /// Availability probe. Side-effect free.
    async fn is_available(&self) -> Result<bool, GatewayError>;
}

/// Calls that write to the contract and therefore need a signer.
#[async_trait]
pub trait ContractWriter: ContractReader {
    /// Store a new encrypted record.
    ///
    /// `reserved` is written to `publicValue2` and is always zero today.
    #[allow(clippy::too_many_arguments)]
    async fn create_business_data(
        &self,
        id: &str,
        name: &str,
        ciphertext: &[u8],
        proof: &[u8],
        confidence: u32,
        reserved: u32,
        description: &str,
    ) -> Result<Box<dyn PendingTransaction>, GatewayError>;

    /// Submit a decryption proof so the contract can verify and store the
    /// clear value.
    ///
    /// Reverts with "Data already verified" if the record is already verified.
    async fn verify_decryption(
        &self,
        id: &str,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn PendingTransaction>, GatewayError>;
}

/// Hands out read-only and signer-bound contract handles.
///
/// `None` means no handle can be built right now (no provider, no wallet
/// signer); callers treat it as "contract connection failed".
#[async_trait]
pub trait ContractConnector: Send + Sync {
    async fn read_only(&self) -> Option<Arc<dyn ContractReader>>;

    async fn with_signer(&self) -> Option<Arc<dyn ContractWriter>>;
}
