//! Serial port transport implementation

use super::{Transport, TransportError, TransportKind};
use crate::core::engine::{self, Link, Timings};
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use tracing::{debug, info, warn};

impl Link for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)?;
        self.flush()
    }

    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read(buf) {
            Ok(n) => Ok(n),
            // Timeout error is fine, no data this poll
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

/// Serial port transport
pub struct SerialTransport {
    timings: Timings,
    port: Option<Box<dyn SerialPort>>,
    channel: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Create a closed serial transport
    pub fn new(timings: Timings) -> Self {
        Self {
            timings,
            port: None,
            channel: String::new(),
            baud_rate: 0,
        }
    }
}

impl Transport for SerialTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    fn list_channels(&self) -> Vec<String> {
        list_ports()
    }

    fn open(&mut self, channel: &str, baud_rate: u32) -> Result<(), TransportError> {
        if self.port.is_some() {
            self.close();
        }

        let port = serialport::new(channel, baud_rate)
            .timeout(self.timings.poll)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    TransportError::Connection(format!("{}: no such device", channel))
                }
                _ => TransportError::Connection(format!("{}: {}", channel, e)),
            })?;

        self.port = Some(port);
        self.channel = channel.to_string();
        self.baud_rate = baud_rate;
        info!("Opened {} @ {} baud", channel, baud_rate);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            // Pending output is irrelevant once the port goes away
            if let Err(e) = port.clear(ClearBuffer::All) {
                warn!("Ignoring error while closing {}: {}", self.channel, e);
            }
            info!("Closed {}", self.channel);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn transact(&mut self, command: &str) -> Result<String, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotConnected)?;
        let exchange = engine::exchange(port, command, &self.timings)?;
        debug!(
            channel = %self.channel,
            termination = ?exchange.termination,
            "transaction finished"
        );
        Ok(exchange.response)
    }

    fn connection_info(&self) -> String {
        if self.port.is_some() {
            format!("{} @ {} baud", self.channel, self.baud_rate)
        } else {
            "Disconnected".to_string()
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// List available serial port names. Enumeration failures yield an empty list.
pub fn list_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            debug!("Serial port enumeration unavailable: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transact_requires_open_port() {
        let mut transport = SerialTransport::new(Timings::default());
        let err = transport.transact("AT").unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[test]
    fn test_open_missing_device_is_connection_error() {
        let mut transport = SerialTransport::new(Timings::default());
        let err = transport
            .open("/dev/atbench-no-such-port", 115_200)
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        assert!(!transport.is_open());
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let mut transport = SerialTransport::new(Timings::default());
        transport.close();
        transport.close();
        assert!(!transport.is_open());
        assert_eq!(transport.connection_info(), "Disconnected");
    }
}
