//! Session management
//!
//! A `Session` owns the transport the user is currently driving and turns
//! transport results into `Transaction` records. `SessionHandle` shares a
//! session with worker tasks: every blocking transaction or batch runs on
//! tokio's blocking pool, and the session mutex guarantees at most one
//! transaction in flight.

use super::batch::{self, BatchEvent, BatchJob, BatchStatus, CancelFlag};
use super::engine::Timings;
use super::transaction::Transaction;
use super::transport::{ActiveTransport, Transport, TransportError, TransportKind};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the batch event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,
    /// Connected and active
    Connected,
}

/// Controller for one active transport
pub struct Session {
    transport: ActiveTransport,
    timings: Timings,
    seed: Option<u64>,
}

impl Session {
    /// Create a session with a closed transport of the given kind
    pub fn new(kind: TransportKind, timings: Timings) -> Self {
        Self {
            transport: ActiveTransport::new(kind, timings, None),
            timings,
            seed: None,
        }
    }

    /// Seed the simulator's random generator for reproducible responses
    #[must_use]
    pub fn with_simulator_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        if self.transport.kind() == TransportKind::Simulated {
            self.transport = ActiveTransport::new(TransportKind::Simulated, self.timings, seed);
        }
        self
    }

    /// Kind of the active transport
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Switch transport variant. The active transport is closed first.
    pub fn select(&mut self, kind: TransportKind) {
        if self.transport.kind() == kind {
            return;
        }
        self.transport.close();
        self.transport = ActiveTransport::new(kind, self.timings, self.seed);
        info!("Switched to {} transport", kind);
    }

    /// Channels offered by the active transport
    pub fn list_channels(&self) -> Vec<String> {
        self.transport.list_channels()
    }

    /// Open a channel on the active transport
    pub fn connect(&mut self, channel: &str, baud_rate: u32) -> Result<(), TransportError> {
        self.transport.open(channel, baud_rate)?;
        info!("Connected to {}", self.connection_info());
        Ok(())
    }

    /// Close the active transport
    pub fn disconnect(&mut self) {
        self.transport.close();
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        if self.transport.is_open() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Describe the open endpoint
    pub fn connection_info(&self) -> String {
        self.transport.connection_info()
    }

    /// Run one transaction. Failures are folded into the returned record.
    pub fn execute(&mut self, command: &str) -> Transaction {
        let command = command.trim();
        let result = self.transport.transact(command);
        if let Err(e) = &result {
            debug!("Transaction for {:?} failed: {}", command, e);
        }
        Transaction::from_result(command, result)
    }

    /// Run a batch job on the calling thread
    pub fn run_batch<F: FnMut(BatchEvent)>(&mut self, job: &BatchJob, report: F) -> BatchStatus {
        batch::run_batch(&mut self.transport, job, report)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.close();
    }
}

/// A batch running on a worker
pub struct BatchRun {
    /// Progress events in issue order; closes when the batch ends
    pub events: mpsc::Receiver<BatchEvent>,
    /// Flag that stops the batch at the next step boundary
    pub cancel: CancelFlag,
    /// Resolves to the terminal status
    pub join: JoinHandle<BatchStatus>,
}

/// Shared handle to a session
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Wrap a session for sharing with workers
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for direct control (connect, select, ...).
    ///
    /// Do not hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    /// Run one transaction on the blocking pool and resolve with its record
    pub async fn send(&self, command: impl Into<String>) -> Transaction {
        let command = command.into();
        let session = Arc::clone(&self.inner);
        let request = command.trim().to_string();

        match tokio::task::spawn_blocking(move || session.lock().execute(&command)).await {
            Ok(transaction) => transaction,
            Err(e) => {
                warn!("Transaction worker failed: {}", e);
                Transaction::from_result(&request, Err(e))
            }
        }
    }

    /// Start a batch on the blocking pool.
    ///
    /// The session stays locked for the whole batch, so interactive sends
    /// queue behind it.
    pub fn run_batch(&self, job: BatchJob) -> BatchRun {
        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = job.cancel_flag();
        let session = Arc::clone(&self.inner);

        let join = tokio::task::spawn_blocking(move || {
            let mut session = session.lock();
            session.run_batch(&job, |event| {
                // Receiver gone means nobody is watching; keep executing
                let _ = tx.blocking_send(event);
            })
        });

        BatchRun {
            events,
            cancel,
            join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::Outcome;
    use crate::core::transport::SIMULATED_CHANNEL;
    use std::io::Write;

    fn simulated_session() -> Session {
        let mut session = Session::new(TransportKind::Simulated, Timings::default())
            .with_simulator_seed(Some(1));
        session.connect(SIMULATED_CHANNEL, 115_200).unwrap();
        session
    }

    #[test]
    fn test_execute_trims_and_records() {
        let mut session = simulated_session();
        let tx = session.execute("  AT  ");
        assert_eq!(tx.request, "AT");
        assert_eq!(tx.outcome, Outcome::Success("OK".into()));
    }

    #[test]
    fn test_execute_while_disconnected_is_error_shaped() {
        let mut session = Session::new(TransportKind::Simulated, Timings::default());
        let tx = session.execute("AT");
        assert!(tx.is_failure());
        assert_eq!(tx.response_text(), "ERROR: Not connected");
    }

    #[test]
    fn test_select_closes_previous_transport() {
        let mut session = simulated_session();
        assert!(session.is_connected());

        session.select(TransportKind::Serial);
        assert_eq!(session.kind(), TransportKind::Serial);
        assert_eq!(session.state(), SessionState::Disconnected);

        session.select(TransportKind::Simulated);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_select_same_kind_keeps_connection() {
        let mut session = simulated_session();
        session.select(TransportKind::Simulated);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_send_dispatches_off_task() {
        let handle = SessionHandle::new(simulated_session());
        let tx = handle.send("ATI").await;
        assert!(tx.response_text().ends_with("OK"));

        handle.lock().disconnect();
        let tx = handle.send("AT").await;
        assert!(tx.is_failure());
    }

    #[tokio::test]
    async fn test_sends_are_reported_in_order() {
        let handle = SessionHandle::new(simulated_session());
        let mut results = Vec::new();
        for cmd in ["AT", "AT+GMR", "AT+CREG?"] {
            results.push(handle.send(cmd).await);
        }
        let requests: Vec<&str> = results.iter().map(|t| t.request.as_str()).collect();
        assert_eq!(requests, vec!["AT", "AT+GMR", "AT+CREG?"]);
    }

    #[tokio::test]
    async fn test_batch_events_stream_incrementally() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AT\nATI\n# skip\nAT+CSQ,signal").unwrap();

        let handle = SessionHandle::new(simulated_session());
        let mut run = handle.run_batch(BatchJob::new(file.path(), 0));

        let mut events = Vec::new();
        while let Some(event) = run.events.recv().await {
            events.push(event);
        }
        let status = run.join.await.unwrap();

        assert_eq!(status, BatchStatus::Completed);
        assert!(matches!(events.first(), Some(BatchEvent::Started { total: 3, .. })));
        assert!(matches!(events.last(), Some(BatchEvent::Finished(BatchStatus::Completed))));
        // started + 3 * (sent, received) + finished
        assert_eq!(events.len(), 8);
    }
}
