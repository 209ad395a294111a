//! Contract gateway for the research vault.
//!
//! The on-chain data store is consumed through three capabilities:
//! [`ContractReader`] for read-only calls, [`ContractWriter`] for calls that
//! need a signer, and [`ContractConnector`] which hands out either kind of
//! handle. [`MemoryContract`] is an in-process implementation used by tests
//! and local development.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::GatewayError;
pub use memory::MemoryContract;
pub use record::{decode_clear_values, encode_clear_values, BusinessData, Handle, TxReceipt};
pub use traits::{ContractConnector, ContractReader, ContractWriter, PendingTransaction};
