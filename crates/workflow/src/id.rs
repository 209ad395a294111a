//! Record identifier generation.
//!
//! Identifiers combine a millisecond timestamp with 64 random bits, so two
//! uploads started in the same millisecond still get distinct ids.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct RecordIdGenerator {
    prefix: String,
}

impl RecordIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `<prefix>-<unix millis>-<16 hex digits>`.
    pub fn next_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let nonce: u64 = rand::random();
        format!("{}-{millis}-{nonce:016x}", self.prefix)
    }
}
