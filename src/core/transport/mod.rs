//! Transport layer
//!
//! Two interchangeable variants implement the same contract:
//! - Serial ports (real modems, USB-serial adapters)
//! - A simulated modem for working without hardware

mod serial;
mod simulated;

pub use serial::{list_ports, SerialTransport};
pub use simulated::{SimulatedTransport, SIMULATED_CHANNEL};

use super::engine::Timings;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard bit rates offered for selection
pub const STANDARD_BAUD_RATES: [u32; 8] = [
    9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800, 921_600,
];

/// Bit rate used when none is configured
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Transport variant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Physical serial port
    #[default]
    Serial,
    /// Simulated modem
    Simulated,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "Serial"),
            Self::Simulated => write!(f, "Simulated"),
        }
    }
}

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Channel missing or could not be claimed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Operation attempted while closed
    #[error("Not connected")]
    NotConnected,

    /// Write or read failure on an open channel
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract shared by every transport variant.
///
/// At most one `transact` may be in flight per instance; callers serialize.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Variant of this transport
    fn kind(&self) -> TransportKind;

    /// Enumerate addressable channels. Never blocks on I/O and never fails.
    fn list_channels(&self) -> Vec<String>;

    /// Open a channel, closing any channel already open
    fn open(&mut self, channel: &str, baud_rate: u32) -> Result<(), TransportError>;

    /// Release the channel. No-op when closed.
    fn close(&mut self);

    /// Check if a channel is open
    fn is_open(&self) -> bool;

    /// Send one command and collect its response
    fn transact(&mut self, command: &str) -> Result<String, TransportError>;

    /// Describe the open endpoint
    fn connection_info(&self) -> String;
}

/// The transport currently driven by a session
pub enum ActiveTransport {
    /// Physical serial port
    Serial(SerialTransport),
    /// Simulated modem
    Simulated(SimulatedTransport),
}

impl ActiveTransport {
    /// Create a closed transport of the given kind
    pub fn new(kind: TransportKind, timings: Timings, seed: Option<u64>) -> Self {
        match kind {
            TransportKind::Serial => Self::Serial(SerialTransport::new(timings)),
            TransportKind::Simulated => Self::Simulated(match seed {
                Some(seed) => SimulatedTransport::with_seed(seed),
                None => SimulatedTransport::new(),
            }),
        }
    }

    fn inner(&self) -> &dyn Transport {
        match self {
            Self::Serial(t) => t,
            Self::Simulated(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Transport {
        match self {
            Self::Serial(t) => t,
            Self::Simulated(t) => t,
        }
    }
}

impl Transport for ActiveTransport {
    fn kind(&self) -> TransportKind {
        self.inner().kind()
    }

    fn list_channels(&self) -> Vec<String> {
        self.inner().list_channels()
    }

    fn open(&mut self, channel: &str, baud_rate: u32) -> Result<(), TransportError> {
        self.inner_mut().open(channel, baud_rate)
    }

    fn close(&mut self) {
        self.inner_mut().close();
    }

    fn is_open(&self) -> bool {
        self.inner().is_open()
    }

    fn transact(&mut self, command: &str) -> Result<String, TransportError> {
        self.inner_mut().transact(command)
    }

    fn connection_info(&self) -> String {
        self.inner().connection_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_transport_delegates_to_variant() {
        let mut transport =
            ActiveTransport::new(TransportKind::Simulated, Timings::default(), Some(7));
        assert_eq!(transport.kind(), TransportKind::Simulated);
        assert_eq!(transport.list_channels(), vec![SIMULATED_CHANNEL.to_string()]);

        transport.open(SIMULATED_CHANNEL, DEFAULT_BAUD_RATE).unwrap();
        assert!(transport.is_open());
        assert_eq!(transport.transact("AT").unwrap(), "OK");

        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_serial_variant_starts_closed() {
        let mut transport = ActiveTransport::new(TransportKind::Serial, Timings::default(), None);
        assert_eq!(transport.kind(), TransportKind::Serial);
        assert!(!transport.is_open());
        assert!(matches!(transport.transact("AT"), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(TransportError::NotConnected.to_string(), "Not connected");
        assert_eq!(
            TransportError::Connection("/dev/ttyUSB9".into()).to_string(),
            "Connection failed: /dev/ttyUSB9"
        );
    }
}
