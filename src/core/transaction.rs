//! Transaction records

use chrono::{DateTime, Local};
use serde::Serialize;

/// Prefix marking a response synthesized from a failure
pub const ERROR_INDICATOR: &str = "ERROR: ";

/// Outcome of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum Outcome {
    /// Device response text
    Success(String),
    /// Human-readable failure reason
    Failure(String),
}

/// One command/response exchange
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// When the command was issued
    pub timestamp: DateTime<Local>,
    /// Trimmed command line
    pub request: String,
    /// Result
    pub outcome: Outcome,
}

impl Transaction {
    /// Build a transaction from a transport result
    pub fn from_result<E: std::fmt::Display>(request: &str, result: Result<String, E>) -> Self {
        let outcome = match result {
            Ok(response) => Outcome::Success(response),
            Err(e) => Outcome::Failure(e.to_string()),
        };
        Self {
            timestamp: Local::now(),
            request: request.to_string(),
            outcome,
        }
    }

    /// Response as delivered to the presentation layer.
    ///
    /// Failures become `ERROR: <reason>` so both outcomes render through one path.
    pub fn response_text(&self) -> String {
        match &self.outcome {
            Outcome::Success(text) => text.clone(),
            Outcome::Failure(reason) => format!("{ERROR_INDICATOR}{reason}"),
        }
    }

    /// Whether the transaction itself failed
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }
}
