//! Submission and verification workflow for encrypted research records.
//!
//! [`WorkflowEngine`] sequences wallet connection, encryption engine
//! initialization, record loading, encrypted upload with transaction
//! confirmation, and the decrypt-then-verify round. It owns all transient
//! session state (status, history, the record store) and exposes it to a
//! presentation layer through accessors and [`EngineSnapshot`].
//!
//! Operations are not serialized against each other: a second upload may
//! start while the first is in flight. Each upload carries its own record
//! identifier and transaction, and the busy flags are advisory only.

pub mod config;
pub mod engine;
pub mod error;
pub mod form;
pub mod history;
pub mod id;
pub mod session;
pub mod status;
pub mod store;

pub use config::{ConfigInvalid, WorkflowConfig};
pub use engine::{EngineSnapshot, InitOutcome, WorkflowEngine};
pub use error::{FormError, WorkflowError};
pub use form::{UploadForm, UploadRequest};
pub use history::{HistoryEntry, OperationHistory};
pub use session::{SessionEvent, SessionPhase, SessionState};
pub use status::{StatusBoard, StatusKind, WorkflowStatus};
pub use store::{Record, RecordStore, ResearchStats, ValueDisplay};
