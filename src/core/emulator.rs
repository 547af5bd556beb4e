//! Modem emulator
//!
//! Plays the device side of a serial link so the real transport can be
//! exercised through a virtual port pair. Every received byte is echoed back
//! immediately, like a modem with echo enabled; once a line is complete the
//! emulator waits a moment and answers `ATI` with an identity block and
//! anything else with `ERROR`.

use super::batch::CancelFlag;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Identity block returned for `ATI`
pub const ATI_RESPONSE: &str = "Manufacturer: INCORPORATED\r\n\
Model: A7600C\r\n\
Revision: A7600C_V1.0\r\n\
IMEI: 351602000330570\r\n\
+GCAP: +CGSM,+FCLASS,+DS\r\n\
\r\n\
OK\r\n";

/// Reply for every other line
pub const ERROR_RESPONSE: &str = "ERROR\r\n";

/// Default pause between a completed line and its reply
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

/// Pause between polls when the port has nothing to read
const IDLE_SLEEP: Duration = Duration::from_millis(20);

/// Line-oriented modem emulator
#[derive(Debug)]
pub struct ModemEmulator {
    line: Vec<u8>,
    reply_delay: Duration,
    lines_answered: u64,
}

impl ModemEmulator {
    /// Create an emulator that waits `reply_delay` before answering
    pub fn new(reply_delay: Duration) -> Self {
        Self {
            line: Vec::new(),
            reply_delay,
            lines_answered: 0,
        }
    }

    /// Accumulate one byte. Returns the trimmed line when `byte` ends it.
    pub fn feed(&mut self, byte: u8) -> Option<String> {
        if byte == b'\r' || byte == b'\n' {
            let line = String::from_utf8_lossy(&self.line).trim().to_string();
            self.line.clear();
            Some(line)
        } else {
            self.line.push(byte);
            None
        }
    }

    /// Reply for a completed line
    pub fn reply(line: &str) -> &'static str {
        if line.eq_ignore_ascii_case("ATI") {
            ATI_RESPONSE
        } else {
            ERROR_RESPONSE
        }
    }

    /// Number of lines answered so far
    pub fn lines_answered(&self) -> u64 {
        self.lines_answered
    }

    /// Serve a port until `stop` is set or the port fails
    pub fn serve<P: Read + Write + ?Sized>(
        &mut self,
        port: &mut P,
        stop: &CancelFlag,
    ) -> io::Result<()> {
        info!("Emulator listening");
        let mut buf = [0u8; 64];

        while !stop.is_cancelled() {
            let n = match port.read(&mut buf) {
                Ok(0) => {
                    std::thread::sleep(IDLE_SLEEP);
                    continue;
                }
                Ok(n) => n,
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
                {
                    std::thread::sleep(IDLE_SLEEP);
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            for &byte in &buf[..n] {
                port.write_all(&[byte])?;
                if let Some(line) = self.feed(byte) {
                    if line.is_empty() {
                        continue;
                    }
                    debug!(%line, "line received");
                    std::thread::sleep(self.reply_delay);
                    port.write_all(Self::reply(&line).as_bytes())?;
                    port.flush()?;
                    self.lines_answered += 1;
                }
            }
        }

        info!("Emulator stopped after {} lines", self.lines_answered);
        Ok(())
    }
}

impl Default for ModemEmulator {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_DELAY)
    }
}
