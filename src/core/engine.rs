//! Transaction engine
//!
//! Writes one command line to a device and reads back its response. The
//! device protocol has no length prefix and no end-of-frame byte, so the read
//! loop decides completion from a fixed set of textual markers combined with
//! silence detection and an absolute deadline.

use super::transport::TransportError;
use std::borrow::Cow;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &[u8] = b"\n";

/// Maximum bytes pulled from the link per poll
pub const READ_CHUNK_SIZE: usize = 1024;

/// Substrings whose appearance ends a response.
///
/// `+CME ERROR` and `+CMS ERROR` are subsumed by `ERROR` but kept so the set
/// documents every final result code the loop is meant to recognise.
pub const TERMINATOR_MARKERS: [&str; 4] = ["OK", "ERROR", "+CME ERROR", "+CMS ERROR"];

/// Time budgets for a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Per-read poll timeout (applied to the port itself)
    pub poll: Duration,
    /// Silence after the last received byte before the response is considered complete
    pub idle_gap: Duration,
    /// Absolute bound on the read loop
    pub deadline: Duration,
}

impl Timings {
    /// Create timings from millisecond values
    pub fn from_millis(poll_ms: u64, idle_gap_ms: u64, deadline_ms: u64) -> Self {
        Self {
            poll: Duration::from_millis(poll_ms),
            idle_gap: Duration::from_millis(idle_gap_ms),
            deadline: Duration::from_millis(deadline_ms),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_millis(200, 350, 10_000)
    }
}

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A terminator marker appeared in the accumulated text
    Marker,
    /// No bytes arrived for longer than the idle gap
    IdleGap,
    /// The absolute deadline expired
    Deadline,
}

/// Result of one write/read cycle
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Response text, decoded permissively
    pub response: String,
    /// Why the loop stopped
    pub termination: Termination,
    /// Raw bytes received
    pub bytes_received: usize,
    /// Time spent in the read loop
    pub elapsed: Duration,
}

/// Byte-level seam between the engine and a physical channel
pub trait Link {
    /// Drop anything already buffered on the input side
    fn discard_input(&mut self) -> io::Result<()>;

    /// Write all bytes and flush them to the device
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever is available, waiting at most one poll timeout.
    ///
    /// Returns `Ok(0)` when the poll expired without data.
    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Decode bytes as UTF-8, replacing invalid sequences instead of failing
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Check whether text contains any terminator marker
pub fn contains_marker(text: &str) -> bool {
    TERMINATOR_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Run one full transaction over a link
pub fn exchange<L: Link + ?Sized>(
    link: &mut L,
    command: &str,
    timings: &Timings,
) -> Result<Exchange, TransportError> {
    link.discard_input()?;

    let mut frame = Vec::with_capacity(command.len() + LINE_TERMINATOR.len());
    frame.extend_from_slice(command.as_bytes());
    frame.extend_from_slice(LINE_TERMINATOR);
    link.send(&frame)?;
    debug!(command, "command written");

    let started = Instant::now();
    let mut last_rx = started;
    let mut accumulated = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    let termination = loop {
        let n = link.poll_read(&mut chunk)?;
        if n > 0 {
            trace!("received {:?}", &chunk[..n]);
            accumulated.extend_from_slice(&chunk[..n]);
            last_rx = Instant::now();
            if contains_marker(&decode_lossy(&accumulated)) {
                break Termination::Marker;
            }
        } else if last_rx.elapsed() > timings.idle_gap {
            break Termination::IdleGap;
        }

        if started.elapsed() > timings.deadline {
            break Termination::Deadline;
        }
    };

    let exchange = Exchange {
        response: decode_lossy(&accumulated).into_owned(),
        termination,
        bytes_received: accumulated.len(),
        elapsed: started.elapsed(),
    };
    debug!(
        termination = ?exchange.termination,
        bytes = exchange.bytes_received,
        elapsed_ms = exchange.elapsed.as_millis() as u64,
        "response complete"
    );
    Ok(exchange)
}
