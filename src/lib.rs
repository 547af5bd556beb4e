//! # atbench Core Library
//!
//! A workbench for AT-command modems over serial lines:
//! - Request/response transactions with marker, idle-gap and deadline framing
//! - A simulated modem for offline use
//! - Paced batch execution from command files, cancellable between steps
//! - A device-side emulator for testing against virtual port pairs
//! - CLI with exit codes and JSON output
//!
//! ## Example
//!
//! ```rust,no_run
//! use atbench_core::{Session, SessionHandle, Timings, TransportKind, SIMULATED_CHANNEL};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new(TransportKind::Simulated, Timings::default());
//!     session.connect(SIMULATED_CHANNEL, 115_200)?;
//!
//!     let handle = SessionHandle::new(session);
//!     let transaction = handle.send("ATI").await;
//!     println!("{}", transaction.response_text());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::{AppConfig, ConfigError};
pub use crate::core::batch::{BatchError, BatchEvent, BatchJob, BatchStatus, CancelFlag};
pub use crate::core::emulator::ModemEmulator;
pub use crate::core::engine::{Exchange, Termination, Timings};
pub use crate::core::logger::{EntryKind, LogEntry};
pub use crate::core::session::{BatchRun, Session, SessionHandle, SessionState};
pub use crate::core::transaction::{Outcome, Transaction};
pub use crate::core::transport::{
    ActiveTransport, SerialTransport, SimulatedTransport, Transport, TransportError,
    TransportKind, SIMULATED_CHANNEL,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
