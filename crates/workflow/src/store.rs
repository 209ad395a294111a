//! In-memory record collection, refreshed wholesale.

use serde::Serialize;
use vault_chain::BusinessData;

/// One research record as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Confidence score, 1 to 10.
    pub public_value1: u32,
    pub public_value2: u32,
    pub creator: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub is_verified: bool,
    /// Present only once the value has been verified on-chain.
    pub decrypted_value: Option<u64>,
}

impl Record {
    /// Project a contract record. The stored clear value is dropped unless
    /// the record is verified.
    pub fn from_chain(id: impl Into<String>, data: BusinessData) -> Self {
        Self {
            id: id.into(),
            decrypted_value: data.is_verified.then_some(data.decrypted_value),
            name: data.name,
            description: data.description,
            public_value1: data.public_value1,
            public_value2: data.public_value2,
            creator: data.creator,
            timestamp: data.timestamp,
            is_verified: data.is_verified,
        }
    }
}

/// How a record's private value may be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValueDisplay {
    /// Verified on-chain.
    Verified(u64),
    /// Decrypted in this session but not (yet) seen verified on-chain.
    LocallyDecrypted(u64),
    Encrypted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResearchStats {
    pub total: usize,
    pub verified: usize,
    pub avg_confidence: f64,
    pub recent_uploads: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Replace the whole collection.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive match on name or description. An empty term matches all.
    pub fn search(&self, term: &str) -> Vec<&Record> {
        let needle = term.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Aggregate statistics. `now` and `recent_window_secs` are in seconds.
    pub fn stats(&self, now: u64, recent_window_secs: u64) -> ResearchStats {
        let total = self.records.len();
        let verified = self.records.iter().filter(|r| r.is_verified).count();
        let avg_confidence = if total == 0 {
            0.0
        } else {
            let sum: u64 = self.records.iter().map(|r| u64::from(r.public_value1)).sum();
            sum as f64 / total as f64
        };
        let recent_uploads = self
            .records
            .iter()
            .filter(|r| now.saturating_sub(r.timestamp) < recent_window_secs)
            .count();

        ResearchStats {
            total,
            verified,
            avg_confidence,
            recent_uploads,
        }
    }
}
