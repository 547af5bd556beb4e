//! CLI Module
//!
//! Provides command-line interface functionality including:
//! - Exit codes for automation
//! - Output rendering (text or JSON lines)

pub mod exit_codes;
pub mod output;

pub use exit_codes::{exit_code_description, exit_code_table, CliResult, ExitCodes};
pub use output::{render_entry, OutputFormat};
