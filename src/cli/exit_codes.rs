//! CLI Exit Codes
//!
//! Standard exit codes for CLI operations and automation.

use crate::config::ConfigError;
use crate::core::batch::{BatchError, BatchStatus};
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// File not found
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// One or more commands failed
    pub const COMMAND_FAILED: u8 = 9;

    /// User cancelled
    pub const CANCELLED: u8 = 11;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success carrying a message for stderr
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Command file could not be read
    pub fn file_access(kind: std::io::ErrorKind, msg: impl Into<String>) -> Self {
        let code = match kind {
            std::io::ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
            std::io::ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
            _ => ExitCodes::ERROR,
        };
        Self::Error(code, msg.into())
    }

    /// No usable port
    pub fn port_not_found(port: &str) -> Self {
        Self::Error(ExitCodes::PORT_NOT_FOUND, format!("Port not found: {port}"))
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to `ExitCode`
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<std::io::Error> for CliResult {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
            ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
            _ => ExitCodes::ERROR,
        };

        Self::Error(code, err.to_string())
    }
}

impl From<TransportError> for CliResult {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            TransportError::Connection(_) | TransportError::NotConnected => {
                ExitCodes::CONNECTION_FAILED
            }
            TransportError::Io(_) => ExitCodes::ERROR,
        };
        Self::Error(code, err.to_string())
    }
}

impl From<BatchError> for CliResult {
    fn from(err: BatchError) -> Self {
        let BatchError::FileAccess { source, .. } = &err;
        Self::file_access(source.kind(), err.to_string())
    }
}

impl From<ConfigError> for CliResult {
    fn from(err: ConfigError) -> Self {
        Self::Error(ExitCodes::CONFIG_ERROR, err.to_string())
    }
}

impl From<BatchStatus> for CliResult {
    fn from(status: BatchStatus) -> Self {
        match status {
            BatchStatus::Completed | BatchStatus::NoCommands => {
                Self::Success(Some(status.to_string()))
            }
            BatchStatus::Cancelled => Self::Error(ExitCodes::CANCELLED, status.to_string()),
        }
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        6 => "File not found",
        7 => "Permission denied",
        8 => "Configuration error",
        9 => "Command failed",
        11 => "Operation cancelled",
        14 => "Port not found",
        127 => "Internal error",
        _ => "Unknown error",
    }
}

/// Every defined exit code, ascending
pub const ALL_EXIT_CODES: [u8; 11] = [
    ExitCodes::SUCCESS,
    ExitCodes::ERROR,
    ExitCodes::INVALID_ARGS,
    ExitCodes::CONNECTION_FAILED,
    ExitCodes::FILE_NOT_FOUND,
    ExitCodes::PERMISSION_DENIED,
    ExitCodes::CONFIG_ERROR,
    ExitCodes::COMMAND_FAILED,
    ExitCodes::CANCELLED,
    ExitCodes::PORT_NOT_FOUND,
    ExitCodes::INTERNAL_ERROR,
];

/// Render the exit code table
pub fn exit_code_table() -> String {
    let mut table = String::from("Exit Codes:\n");
    for code in ALL_EXIT_CODES {
        table.push_str(&format!("  {:>3}  {}\n", code, exit_code_description(code)));
    }
    table
}
