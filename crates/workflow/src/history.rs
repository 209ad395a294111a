//! Bounded, most-recent-first operation history.

use std::collections::VecDeque;

use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub text: String,
}

impl HistoryEntry {
    /// `HH:MM:SS: text`, the form shown in the history panel.
    pub fn label(&self) -> String {
        let clock = format_description!("[hour]:[minute]:[second]");
        let time = self
            .at
            .format(&clock)
            .unwrap_or_else(|_| "--:--:--".to_string());
        format!("{time}: {}", self.text)
    }
}

/// Append-only history that evicts its oldest entry beyond capacity.
#[derive(Debug, Clone)]
pub struct OperationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl OperationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.push_at(OffsetDateTime::now_utc(), text);
    }

    pub fn push_at(&mut self, at: OffsetDateTime, text: impl Into<String>) {
        self.entries.push_front(HistoryEntry {
            at,
            text: text.into(),
        });
        self.entries.truncate(self.capacity);
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn eleventh_entry_evicts_oldest() {
        let mut history = OperationHistory::new(10);
        for i in 1..=11 {
            history.push(format!("op {i}"));
        }
        assert_eq!(history.len(), 10);
        let texts: Vec<&str> = history.entries().map(|e| e.text.as_str()).collect();
        let expected: Vec<String> = (2..=11).rev().map(|i| format!("op {i}")).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn label_uses_wall_clock() {
        let mut history = OperationHistory::new(10);
        history.push_at(datetime!(2026-10-18 09:05:07 UTC), "ran availability check");
        assert_eq!(
            history.latest().unwrap().label(),
            "09:05:07: ran availability check"
        );
    }

    #[test]
    fn zero_capacity_still_keeps_latest() {
        let mut history = OperationHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().text, "b");
    }
}
