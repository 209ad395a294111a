//! The workflow engine.
//!
//! Sequence: connect → initialize encryption → load records → upload or
//! decrypt. Every public operation resolves to a status message and a
//! recoverable state; nothing here panics or aborts the process.
//!
//! There is no engine-level mutual exclusion. Two uploads may be in flight
//! at once, each with its own record id and transaction. The refreshing,
//! uploading and decrypting flags exist so a shell can disable buttons;
//! they do not guard data.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use vault_chain::{
    ContractConnector, ContractReader, ContractWriter, GatewayError, PendingTransaction,
};
use vault_fhe::{EncryptionCapability, OnChainVerifier};

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::form::{UploadForm, UploadRequest};
use crate::history::{HistoryEntry, OperationHistory};
use crate::id::RecordIdGenerator;
use crate::session::{SessionEvent, SessionPhase, SessionState};
use crate::status::{StatusBoard, WorkflowStatus};
use crate::store::{Record, RecordStore, ResearchStats, ValueDisplay};

/// Written to `publicValue2` on every upload.
const RESERVED_PUBLIC_VALUE: u32 = 0;

// ──────────────────────────────────────────────
// Engine state
// ──────────────────────────────────────────────

struct EngineState {
    session: SessionState,
    /// Bumped whenever a wallet event starts or ends a session. Async work
    /// captures it up front and drops its result if it changed.
    epoch: u64,
    records: RecordStore,
    history: OperationHistory,
    /// Values decrypted in this session, kept apart from the authoritative
    /// records.
    local_values: HashMap<String, u64>,
    form: UploadForm,
    upload_open: bool,
    contract_address: Option<String>,
    refreshing: usize,
    uploading: usize,
    decrypting: usize,
}

impl EngineState {
    fn apply(&mut self, event: SessionEvent) -> bool {
        let Some(next) = self.session.transition(&event) else {
            debug!(?event, phase = ?self.session.phase(), "session event ignored");
            return false;
        };
        debug!(from = ?self.session.phase(), to = ?next.phase(), "session transition");

        let starts_session = matches!(
            event,
            SessionEvent::WalletConnected { .. } | SessionEvent::WalletDisconnected
        );
        self.session = next;
        if starts_session {
            self.epoch += 1;
            self.records.clear();
            self.local_values.clear();
            self.contract_address = None;
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Busy {
    Refreshing,
    Uploading,
    Decrypting,
}

/// Lowers a busy flag when the operation ends, whichever way it ends.
struct BusyGuard<'a> {
    engine: &'a WorkflowEngine,
    busy: Busy,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.lock();
        let counter = state.counter(self.busy);
        *counter = counter.saturating_sub(1);
    }
}

impl EngineState {
    fn counter(&mut self, busy: Busy) -> &mut usize {
        match busy {
            Busy::Refreshing => &mut self.refreshing,
            Busy::Uploading => &mut self.uploading,
            Busy::Decrypting => &mut self.decrypting,
        }
    }
}

/// Result of [`WorkflowEngine::ensure_initialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    NotConnected,
    /// Another call is already initializing this session.
    InProgress,
    AlreadyReady,
    Initialized,
    Failed,
    /// The session ended while initialization was running.
    Superseded,
}

enum Verification {
    AlreadyVerified(u64),
    Decrypted(u64),
}

/// Everything a presentation layer renders, captured at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub phase: SessionPhase,
    pub address: Option<String>,
    pub contract_address: Option<String>,
    pub refreshing: bool,
    pub uploading: bool,
    pub decrypting: bool,
    pub upload_open: bool,
    pub status: WorkflowStatus,
    pub history: Vec<HistoryEntry>,
    pub records: Vec<Record>,
    pub stats: ResearchStats,
}

// ──────────────────────────────────────────────
// WorkflowEngine
// ──────────────────────────────────────────────

pub struct WorkflowEngine {
    connector: Arc<dyn ContractConnector>,
    encryption: Arc<dyn EncryptionCapability>,
    config: WorkflowConfig,
    ids: RecordIdGenerator,
    status: StatusBoard,
    state: Mutex<EngineState>,
}

impl WorkflowEngine {
    pub fn new(
        connector: Arc<dyn ContractConnector>,
        encryption: Arc<dyn EncryptionCapability>,
        config: WorkflowConfig,
    ) -> Self {
        let state = EngineState {
            session: SessionState::Disconnected,
            epoch: 0,
            records: RecordStore::default(),
            history: OperationHistory::new(config.history_capacity),
            local_values: HashMap::new(),
            form: UploadForm::default(),
            upload_open: false,
            contract_address: None,
            refreshing: 0,
            uploading: 0,
            decrypting: 0,
        };
        Self {
            connector,
            encryption,
            ids: RecordIdGenerator::new(config.record_id_prefix.clone()),
            status: StatusBoard::new(config.success_status_ttl(), config.error_status_ttl()),
            config,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // Recover data even if the mutex was poisoned by a panic in another thread
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn busy(&self, busy: Busy) -> BusyGuard<'_> {
        *self.lock().counter(busy) += 1;
        BusyGuard { engine: self, busy }
    }

    /// Await a gateway or encryption call, bounded by the configured timeout.
    async fn bounded<T, E, F>(&self, call: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, E>>,
        WorkflowError: From<E>,
    {
        match self.config.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| WorkflowError::TimedOut(limit))?
                .map_err(WorkflowError::from),
            None => call.await.map_err(WorkflowError::from),
        }
    }

    /// Await a handle acquisition, bounded like any other call. `None` means
    /// no handle could be built.
    async fn acquire<T, F>(&self, call: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Option<T>>,
    {
        let handle = match self.config.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| WorkflowError::TimedOut(limit))?,
            None => call.await,
        };
        handle.ok_or(WorkflowError::ContractUnavailable)
    }

    async fn reader(&self) -> Result<Arc<dyn ContractReader>, WorkflowError> {
        self.acquire(self.connector.read_only()).await
    }

    async fn writer(&self) -> Result<Arc<dyn ContractWriter>, WorkflowError> {
        self.acquire(self.connector.with_signer()).await
    }

    /// Report a refused operation and hand the error back.
    fn refuse(&self, err: WorkflowError) -> WorkflowError {
        warn!(reason = %err, "operation refused");
        self.status.error(err.detail());
        err
    }

    fn require_ready(&self) -> Result<(String, u64), WorkflowError> {
        let state = self.lock();
        match &state.session {
            SessionState::Ready { address } => Ok((address.clone(), state.epoch)),
            SessionState::Disconnected => Err(WorkflowError::NotConnected),
            _ => Err(WorkflowError::NotInitialized),
        }
    }

    // ── Connection and initialization ─────────────────────────────────────────

    /// Feed the wallet connection signal. `Some(address)` means connected.
    ///
    /// On a fresh connection this initializes the encryption engine and, once
    /// ready, loads the contract address and the records.
    pub async fn wallet_changed(&self, address: Option<String>) {
        let connected = address.is_some();
        let event = match address {
            Some(address) => SessionEvent::WalletConnected { address },
            None => SessionEvent::WalletDisconnected,
        };
        if self.lock().apply(event) && !connected {
            info!("wallet disconnected, session discarded");
        }

        if connected && self.ensure_initialized().await == InitOutcome::Initialized {
            self.on_ready().await;
        }
    }

    pub async fn connect(&self, address: impl Into<String>) {
        self.wallet_changed(Some(address.into())).await;
    }

    pub async fn disconnect(&self) {
        self.wallet_changed(None).await;
    }

    /// Initialize the encryption engine for the current session, at most once.
    ///
    /// Safe to call repeatedly: while initialization is in flight or already
    /// done, no further `initialize` call is issued. After a failure the
    /// session is back in `Connected` and a later call retries.
    pub async fn ensure_initialized(&self) -> InitOutcome {
        let epoch = {
            let mut state = self.lock();
            match state.session {
                SessionState::Disconnected => return InitOutcome::NotConnected,
                SessionState::Initializing { .. } => return InitOutcome::InProgress,
                SessionState::Ready { .. } => return InitOutcome::AlreadyReady,
                SessionState::Connected { .. } => {}
            }
            state.apply(SessionEvent::InitStarted);
            state.epoch
        };

        info!("initializing encryption engine");
        let result = self.bounded(self.encryption.initialize()).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!("initialization finished for a previous session, ignoring");
            return InitOutcome::Superseded;
        }
        match result {
            Ok(()) => {
                state.apply(SessionEvent::InitSucceeded);
                info!("encryption engine ready");
                InitOutcome::Initialized
            }
            Err(e) => {
                state.apply(SessionEvent::InitFailed);
                drop(state);
                error!(error = %e, "encryption initialization failed");
                self.status.error("encryption system initialization failed");
                InitOutcome::Failed
            }
        }
    }

    async fn on_ready(&self) {
        let epoch = self.lock().epoch;
        let address = match self.reader().await {
            Ok(reader) => self.bounded(reader.address()).await,
            Err(e) => Err(e),
        };
        match address {
            Ok(address) => {
                let mut state = self.lock();
                if state.epoch == epoch {
                    state.contract_address = Some(address);
                }
            }
            Err(e) => warn!(error = %e, "could not read contract address"),
        }
        // Failures are already on the status board.
        let _ = self.load_records().await;
    }

    // ── Record loading ───────────────────────────────────────────────────────

    /// Reload every record from the contract, replacing the store.
    ///
    /// Records that fail to load individually are skipped. Returns the number
    /// of records loaded.
    pub async fn load_records(&self) -> Result<usize, WorkflowError> {
        let (_, epoch) = self.require_ready().map_err(|e| self.refuse(e))?;
        let _busy = self.busy(Busy::Refreshing);

        match self.fetch_records().await {
            Ok(records) => {
                let count = records.len();
                let mut state = self.lock();
                if state.epoch != epoch {
                    debug!("records loaded for a previous session, discarding");
                    return Err(WorkflowError::SessionChanged);
                }
                state.records.replace(records);
                state.history.push(format!("loaded {count} research records"));
                info!(count, "records loaded");
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "record load failed");
                self.status.error("data load failed");
                Err(e)
            }
        }
    }

    /// Same as [`load_records`](Self::load_records); the shell's refresh button.
    pub async fn refresh(&self) -> Result<usize, WorkflowError> {
        self.load_records().await
    }

    async fn fetch_records(&self) -> Result<Vec<Record>, WorkflowError> {
        let reader = self.reader().await?;
        let ids = self.bounded(reader.get_all_business_ids()).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.bounded(reader.get_business_data(&id)).await {
                Ok(data) => records.push(Record::from_chain(id, data)),
                Err(e) => warn!(record = %id, error = %e, "skipping record that failed to load"),
            }
        }
        Ok(records)
    }

    /// Reload after a successful write, if the session is still usable.
    async fn reload_after_write(&self) {
        if self.lock().session.is_ready() {
            let _ = self.load_records().await;
        }
    }

    // ── Upload ───────────────────────────────────────────────────────────────

    /// Encrypt and submit the current upload form.
    ///
    /// On success the form is cleared and closed, then the records are
    /// reloaded. On failure the form is left exactly as entered and no
    /// record is added locally.
    pub async fn upload(&self) -> Result<String, WorkflowError> {
        let (user, request) = self.upload_preconditions().map_err(|e| self.refuse(e))?;
        let _busy = self.busy(Busy::Uploading);

        match self.submit_upload(&user, &request).await {
            Ok(record_id) => {
                self.status.success("research data uploaded");
                {
                    let mut state = self.lock();
                    state
                        .history
                        .push(format!("uploaded research data: {}", request.name));
                    state.form = UploadForm::default();
                    state.upload_open = false;
                }
                self.reload_after_write().await;
                Ok(record_id)
            }
            Err(e) => {
                error!(error = %e, "upload failed");
                let message = if e.is_user_rejection() {
                    "user cancelled the transaction".to_string()
                } else {
                    format!("upload failed: {}", e.detail())
                };
                self.status.error(message);
                Err(e)
            }
        }
    }

    fn upload_preconditions(&self) -> Result<(String, UploadRequest), WorkflowError> {
        let (address, _) = self.require_ready()?;
        let request = self.lock().form.validate()?;
        Ok((address, request))
    }

    async fn submit_upload(
        &self,
        user: &str,
        request: &UploadRequest,
    ) -> Result<String, WorkflowError> {
        let writer = self.writer().await?;
        let record_id = self.ids.next_id();
        let context = self.bounded(writer.address()).await?;

        self.status.pending("encrypting and uploading");
        let input = self
            .bounded(self.encryption.encrypt(&context, user, request.value))
            .await?;

        let tx = self
            .bounded(writer.create_business_data(
                &record_id,
                &request.name,
                &input.ciphertext,
                &input.proof,
                request.confidence,
                RESERVED_PUBLIC_VALUE,
                &request.description,
            ))
            .await?;
        debug!(hash = tx.hash(), record = %record_id, "create submitted");

        self.status.pending("awaiting confirmation");
        let receipt = self.bounded(tx.wait()).await?;
        info!(record = %record_id, block = receipt.block, "record created");
        Ok(record_id)
    }

    // ── Decrypt and verify ───────────────────────────────────────────────────

    /// Decrypt a record's value and get it verified on-chain.
    ///
    /// Returns the clear value, or `None` when there is no new information:
    /// on failure, or when someone else verified the record first (the
    /// reloaded record then carries the value). `None` never means zero.
    pub async fn decrypt(&self, record_id: &str) -> Option<u64> {
        let epoch = {
            let state = self.lock();
            state.session.is_connected().then_some(state.epoch)
        };
        let Some(epoch) = epoch else {
            self.refuse(WorkflowError::NotConnected);
            return None;
        };
        let _busy = self.busy(Busy::Decrypting);

        match self.verify_record(record_id).await {
            Ok(Verification::AlreadyVerified(value)) => {
                self.status.success("already verified on-chain");
                Some(value)
            }
            Ok(Verification::Decrypted(value)) => {
                {
                    let mut state = self.lock();
                    if state.epoch == epoch {
                        state.local_values.insert(record_id.to_string(), value);
                    }
                }
                self.reload_after_write().await;
                self.lock()
                    .history
                    .push(format!("decrypted and verified: {record_id}"));
                self.status.success("decryption verified");
                Some(value)
            }
            Err(e) if e.is_already_verified() => {
                info!(record = record_id, "record was verified concurrently");
                self.reload_after_write().await;
                self.status.success("already verified on-chain");
                None
            }
            Err(e) => {
                error!(record = record_id, error = %e, "decryption failed");
                self.status.error(format!("decryption failed: {}", e.detail()));
                None
            }
        }
    }

    async fn verify_record(&self, record_id: &str) -> Result<Verification, WorkflowError> {
        let reader = self.reader().await?;
        let data = self.bounded(reader.get_business_data(record_id)).await?;
        if data.is_verified {
            debug!(record = record_id, "already verified, skipping decryption");
            return Ok(Verification::AlreadyVerified(data.decrypted_value));
        }

        if !self.lock().session.is_ready() {
            return Err(WorkflowError::NotInitialized);
        }
        let writer = self.writer().await?;
        let handle = self.bounded(reader.get_encrypted_value(record_id)).await?;
        let context = self.bounded(reader.address()).await?;

        self.status.pending("verifying decryption on-chain");
        let verifier = RecordVerifier { writer, record_id };
        let result = self
            .bounded(self.encryption.decrypt_and_verify(
                std::slice::from_ref(&handle),
                &context,
                &verifier,
            ))
            .await?;

        result
            .clear_values
            .get(&handle)
            .copied()
            .map(Verification::Decrypted)
            .ok_or(WorkflowError::MissingClearValue(handle))
    }

    // ── Availability ─────────────────────────────────────────────────────────

    /// Probe the contract. Only a positive answer is reported; a negative
    /// answer or an error is logged and otherwise ignored.
    pub async fn check_availability(&self) -> bool {
        let reader = match self.reader().await {
            Ok(reader) => reader,
            Err(e) => {
                warn!(error = %e, "availability check skipped: no contract handle");
                return false;
            }
        };
        match self.bounded(reader.is_available()).await {
            Ok(true) => {
                self.status.success("availability check passed");
                self.lock().history.push("ran availability check");
                true
            }
            Ok(false) => {
                warn!("contract reports unavailable");
                false
            }
            Err(e) => {
                warn!(error = %e, "availability check failed");
                false
            }
        }
    }

    // ── Upload form ──────────────────────────────────────────────────────────

    pub fn open_upload(&self) {
        self.lock().upload_open = true;
    }

    /// Close the form without discarding what was typed.
    pub fn close_upload(&self) {
        self.lock().upload_open = false;
    }

    pub fn set_upload_form(&self, form: UploadForm) {
        self.lock().form = form;
    }

    pub fn upload_form(&self) -> UploadForm {
        self.lock().form.clone()
    }

    pub fn is_upload_open(&self) -> bool {
        self.lock().upload_open
    }

    // ── Read-only views ──────────────────────────────────────────────────────

    pub fn session(&self) -> SessionState {
        self.lock().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing > 0
    }

    pub fn is_uploading(&self) -> bool {
        self.lock().uploading > 0
    }

    pub fn is_decrypting(&self) -> bool {
        self.lock().decrypting > 0
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status.current()
    }

    /// History entries, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.entries().cloned().collect()
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().records.all().to_vec()
    }

    pub fn record(&self, id: &str) -> Option<Record> {
        self.lock().records.get(id).cloned()
    }

    pub fn search(&self, term: &str) -> Vec<Record> {
        self.lock().records.search(term).into_iter().cloned().collect()
    }

    pub fn stats(&self) -> ResearchStats {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.lock()
            .records
            .stats(now, self.config.recent_window_secs)
    }

    pub fn contract_address(&self) -> Option<String> {
        self.lock().contract_address.clone()
    }

    /// Value decrypted locally this session, if any.
    pub fn local_value(&self, id: &str) -> Option<u64> {
        self.lock().local_values.get(id).copied()
    }

    /// What may be shown for a record's private value. On-chain verification
    /// takes precedence over a local decrypt.
    pub fn value_display(&self, id: &str) -> ValueDisplay {
        let state = self.lock();
        if let Some(value) = state.records.get(id).and_then(|r| r.decrypted_value) {
            ValueDisplay::Verified(value)
        } else if let Some(value) = state.local_values.get(id) {
            ValueDisplay::LocallyDecrypted(*value)
        } else {
            ValueDisplay::Encrypted
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let stats = self.stats();
        let status = self.status();
        let state = self.lock();
        EngineSnapshot {
            phase: state.session.phase(),
            address: state.session.address().map(str::to_string),
            contract_address: state.contract_address.clone(),
            refreshing: state.refreshing > 0,
            uploading: state.uploading > 0,
            decrypting: state.decrypting > 0,
            upload_open: state.upload_open,
            status,
            history: state.history.entries().cloned().collect(),
            records: state.records.all().to_vec(),
            stats,
        }
    }
}

// ──────────────────────────────────────────────
// On-chain verification callback
// ──────────────────────────────────────────────

/// Submits a decryption proof for one record with the session's signer.
struct RecordVerifier<'a> {
    writer: Arc<dyn ContractWriter>,
    record_id: &'a str,
}

#[async_trait]
impl<'a> OnChainVerifier for RecordVerifier<'a> {
    async fn submit(
        &self,
        clear_values: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn PendingTransaction>, GatewayError> {
        debug!(record = self.record_id, "submitting decryption proof");
        self.writer
            .verify_decryption(self.record_id, clear_values, proof)
            .await
    }
}
