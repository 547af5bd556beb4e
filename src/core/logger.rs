//! Reported events
//!
//! Timestamped entries handed to the presentation layer. Entries are not
//! persisted; the front end decides how to render them.

use super::transaction::Transaction;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Substring that classifies an output entry as an error
pub const ERROR_MARKER: &str = "ERROR";

/// Entry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Command sent
    Input,
    /// Response received
    Output,
    /// Response received that carries the error marker
    Error,
    /// Batch progress or terminal status text
    Status,
}

/// A single reported entry
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// When the entry was produced
    pub timestamp: DateTime<Local>,
    /// Classification
    pub kind: EntryKind,
    /// Command, response or status text
    pub text: String,
}

impl LogEntry {
    /// Entry for a command about to be sent
    pub fn input(command: &str) -> Self {
        Self::at(Local::now(), EntryKind::Input, command.to_string())
    }

    /// Entry for a response, classified by content
    pub fn output(response: &str) -> Self {
        Self::at(Local::now(), classify(response), response.trim().to_string())
    }

    /// Status line
    pub fn status(message: impl Into<String>) -> Self {
        Self::at(Local::now(), EntryKind::Status, message.into())
    }

    fn at(timestamp: DateTime<Local>, kind: EntryKind, text: String) -> Self {
        Self {
            timestamp,
            kind,
            text,
        }
    }

    /// Format as text
    pub fn to_text(&self, show_timestamp: bool) -> String {
        let body = match self.kind {
            EntryKind::Input => format!("> {}", self.text),
            _ => self.text.clone(),
        };

        if show_timestamp {
            format!("[{}]\n{}", self.timestamp.format("%H:%M:%S"), body)
        } else {
            body
        }
    }

    /// Format as JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Classify response text as plain output or error
pub fn classify(response: &str) -> EntryKind {
    if response.contains(ERROR_MARKER) {
        EntryKind::Error
    } else {
        EntryKind::Output
    }
}

impl Transaction {
    /// The input/output entry pair for this transaction
    pub fn entries(&self) -> [LogEntry; 2] {
        let response = self.response_text();
        [
            LogEntry::at(self.timestamp, EntryKind::Input, self.request.clone()),
            LogEntry::at(Local::now(), classify(&response), response.trim().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::TransportError;

    #[test]
    fn test_input_entry_text() {
        let entry = LogEntry::input("AT+CSQ");
        assert_eq!(entry.kind, EntryKind::Input);
        assert_eq!(entry.to_text(false), "> AT+CSQ");
        assert!(entry.to_text(true).starts_with('['));
    }

    #[test]
    fn test_output_classification() {
        assert_eq!(LogEntry::output("OK\r\n").kind, EntryKind::Output);
        assert_eq!(LogEntry::output("+CME ERROR: 10").kind, EntryKind::Error);
        assert_eq!(LogEntry::output("OK\r\n").text, "OK");
    }

    #[test]
    fn test_failed_transaction_entries() {
        let tx =
            Transaction::from_result::<TransportError>("AT", Err(TransportError::NotConnected));
        let [input, output] = tx.entries();
        assert_eq!(input.kind, EntryKind::Input);
        assert_eq!(output.kind, EntryKind::Error);
        assert_eq!(output.text, "ERROR: Not connected");
    }

    #[test]
    fn test_json_line() {
        let json = LogEntry::status("Completed").to_json();
        assert!(json.contains("\"kind\":\"status\""));
        assert!(json.contains("\"text\":\"Completed\""));
    }
}
