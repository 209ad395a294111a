//! Text rendering of engine state.

use std::fmt::Write as _;

use serde::Serialize;
use vault_workflow::{
    HistoryEntry, Record, ResearchStats, StatusKind, ValueDisplay, WorkflowStatus,
};

pub fn status_line(status: &WorkflowStatus) -> Option<String> {
    if !status.visible {
        return None;
    }
    let tag = match status.kind {
        StatusKind::Pending => "pending",
        StatusKind::Success => "ok",
        StatusKind::Error => "error",
    };
    Some(format!("[{tag}] {}", status.message))
}

pub fn value(display: ValueDisplay) -> String {
    match display {
        ValueDisplay::Verified(v) => format!("{v} (verified)"),
        ValueDisplay::LocallyDecrypted(v) => format!("{v} (decrypted locally)"),
        ValueDisplay::Encrypted => "encrypted".to_string(),
    }
}

/// One line per record.
pub fn record_line(record: &Record, display: ValueDisplay) -> String {
    format!(
        "{}  {}  confidence {}/10  value {}",
        record.id,
        record.name,
        record.public_value1,
        value(display)
    )
}

pub fn record_detail(record: &Record, display: ValueDisplay) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", record.id);
    let _ = writeln!(out, "name:        {}", record.name);
    if !record.description.is_empty() {
        let _ = writeln!(out, "description: {}", record.description);
    }
    let _ = writeln!(out, "confidence:  {}/10", record.public_value1);
    let _ = writeln!(out, "creator:     {}", record.creator);
    let _ = writeln!(out, "timestamp:   {}", record.timestamp);
    let _ = write!(out, "value:       {}", value(display));
    out
}

pub fn stats(stats: &ResearchStats) -> String {
    format!(
        "total {}  verified {}  avg confidence {:.1}  recent {}",
        stats.total, stats.verified, stats.avg_confidence, stats.recent_uploads
    )
}

pub fn history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(HistoryEntry::label)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e))
}
