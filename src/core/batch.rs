//! Batch replay
//!
//! Reads an ordered list of commands from a text file and executes them one
//! by one through a transport, pacing the steps and honouring a cooperative
//! cancellation flag between them.
//!
//! File format: one command per line, `#` starts a comment line, blank lines
//! are ignored and anything after the first `,` is an annotation.

use super::logger::LogEntry;
use super::transaction::{Transaction, ERROR_INDICATOR};
use super::transport::Transport;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Comment line prefix
pub const COMMENT_PREFIX: char = '#';

/// Separator between a command and its trailing annotation
pub const ANNOTATION_SEPARATOR: char = ',';

/// Batch error types
#[derive(Error, Debug)]
pub enum BatchError {
    /// Command file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    FileAccess {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

/// Parse command file contents. Malformed lines are normalized, never rejected.
///
/// An annotation-only line such as `, note` yields an empty command, so every
/// listed line still produces one transaction.
pub fn parse_commands(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
        .map(|line| match line.split_once(ANNOTATION_SEPARATOR) {
            Some((command, _annotation)) => command.trim(),
            None => line,
        })
        .map(str::to_string)
        .collect()
}

/// Read and parse a command file
pub fn load_commands(path: &Path) -> Result<Vec<String>, BatchError> {
    let bytes = std::fs::read(path).map_err(|source| BatchError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_commands(&String::from_utf8_lossy(&bytes)))
}

/// Cancellation flag shared between a running batch and its controller
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next step boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One batch invocation
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Command file
    pub path: PathBuf,
    /// Pause after each executed command
    pub delay: Duration,
    cancel: CancelFlag,
}

impl BatchJob {
    /// Create a job with a fresh cancellation flag
    pub fn new(path: impl Into<PathBuf>, delay_ms: u64) -> Self {
        Self {
            path: path.into(),
            delay: Duration::from_millis(delay_ms),
            cancel: CancelFlag::new(),
        }
    }

    /// Handle to this job's cancellation flag
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every command was executed
    Completed,
    /// The cancellation flag was raised before the batch ended
    Cancelled,
    /// Nothing to execute (empty or unreadable file)
    NoCommands,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "All commands completed"),
            Self::Cancelled => write!(f, "Stopped by cancellation"),
            Self::NoCommands => write!(f, "No commands found"),
        }
    }
}

/// Batch progress event
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Command file could not be read
    FileError {
        /// Kind of the underlying I/O failure
        kind: io::ErrorKind,
        /// Human-readable reason
        reason: String,
    },
    /// Execution is about to start
    Started {
        /// Command file
        path: PathBuf,
        /// Number of commands to run
        total: usize,
    },
    /// Command about to be sent
    CommandSent {
        /// Zero-based step
        index: usize,
        /// Trimmed command line
        command: String,
    },
    /// Response for the command at `index`
    ResponseReceived {
        /// Zero-based step
        index: usize,
        /// Completed transaction
        transaction: Transaction,
    },
    /// Terminal status
    Finished(BatchStatus),
}

impl BatchEvent {
    /// Render as a reported entry
    pub fn to_entry(&self) -> LogEntry {
        match self {
            Self::FileError { reason, .. } => {
                LogEntry::output(&format!("{ERROR_INDICATOR}{reason}"))
            }
            Self::Started { path, total } => LogEntry::status(format!(
                "Running file: {} ({} commands)",
                path.display(),
                total
            )),
            Self::CommandSent { command, .. } => LogEntry::input(command),
            Self::ResponseReceived { transaction, .. } => {
                LogEntry::output(&transaction.response_text())
            }
            Self::Finished(status) => LogEntry::status(status.to_string()),
        }
    }
}

/// Execute a batch job against an open transport.
///
/// Issues exactly one `transact` per listed command, in file order, with no
/// retries. A failing command is reported as an error-shaped response and
/// the batch continues. The per-step delay follows every executed command,
/// the last one included, and a cancellation raised during that final pause
/// still ends the batch as cancelled.
pub fn run_batch<T, F>(transport: &mut T, job: &BatchJob, mut report: F) -> BatchStatus
where
    T: Transport + ?Sized,
    F: FnMut(BatchEvent),
{
    let commands = match load_commands(&job.path) {
        Ok(commands) => commands,
        Err(e) => {
            warn!("{}", e);
            let BatchError::FileAccess { source, .. } = &e;
            report(BatchEvent::FileError {
                kind: source.kind(),
                reason: e.to_string(),
            });
            Vec::new()
        }
    };

    if commands.is_empty() {
        report(BatchEvent::Finished(BatchStatus::NoCommands));
        return BatchStatus::NoCommands;
    }

    info!("Running {} commands from {}", commands.len(), job.path.display());
    report(BatchEvent::Started {
        path: job.path.clone(),
        total: commands.len(),
    });

    let mut executed = 0;
    for (index, command) in commands.iter().enumerate() {
        if job.cancel.is_cancelled() {
            break;
        }

        report(BatchEvent::CommandSent {
            index,
            command: command.clone(),
        });
        let transaction = Transaction::from_result(command, transport.transact(command));
        executed += 1;
        report(BatchEvent::ResponseReceived { index, transaction });

        if !job.delay.is_zero() {
            std::thread::sleep(job.delay);
        }
    }

    let status = if executed == commands.len() && !job.cancel.is_cancelled() {
        BatchStatus::Completed
    } else {
        BatchStatus::Cancelled
    };
    info!("Batch finished after {}/{} commands: {}", executed, commands.len(), status);
    report(BatchEvent::Finished(status));
    status
}
