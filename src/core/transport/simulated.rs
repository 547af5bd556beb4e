//! Simulated modem transport
//!
//! Answers a fixed table of AT commands without any hardware. Responses are
//! deterministic except for the signal-quality query, which draws a random
//! RSSI from the transport's own generator (seedable for reproducible runs).

use super::{Transport, TransportError, TransportKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// The single channel advertised by the simulator
pub const SIMULATED_CHANNEL: &str = "DEMO: Mock Modem";

const EOL: &str = "\n";

/// Ctrl-Z, terminates the message body after an SMS prompt
const SUBMIT: char = '\u{1a}';

const CANNED_RESPONSES: &[(&str, &str)] = &[
    ("AT", "OK"),
    (
        "ATI",
        "Manufacturer: DemoCorp\nModel: DEMO-01\nRevision: 1.2.3\nOK",
    ),
    ("AT+GMR", "DEMO FW 1.2.3\nOK"),
    ("AT+CSQ", "+CSQ: 18,99\nOK"),
    ("AT+CREG?", "+CREG: 0,1\nOK"),
    ("AT+CMEE=2", "OK"),
    ("AT+CMGF=1", "OK"),
    ("AT+CMGS=\"+391234567890\"", "> "),
];

/// Simulated modem
pub struct SimulatedTransport {
    connected: bool,
    rng: StdRng,
}

impl SimulatedTransport {
    /// Create a simulator seeded from system entropy
    pub fn new() -> Self {
        Self {
            connected: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a simulator with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            connected: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn respond(&mut self, command: &str) -> String {
        if command.contains("ERROR") {
            return "ERROR".to_string();
        }
        if command.ends_with(SUBMIT) {
            return format!("+CMGS: 42{EOL}OK");
        }
        if let Some((_, response)) = CANNED_RESPONSES.iter().find(|(cmd, _)| *cmd == command) {
            return (*response).to_string();
        }
        if command.starts_with("AT+CSQ") {
            let rssi: u8 = self.rng.gen_range(5..=31);
            return format!("+CSQ: {rssi},99{EOL}OK");
        }
        if command.starts_with("AT+GMR") {
            return format!("DEMO FW 1.2.3{EOL}OK");
        }
        if command.starts_with("AT+CMGS") {
            // Prompt for the message body; the body itself is not modelled further
            return "> ".to_string();
        }
        "OK".to_string()
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Simulated
    }

    fn list_channels(&self) -> Vec<String> {
        vec![SIMULATED_CHANNEL.to_string()]
    }

    fn open(&mut self, channel: &str, _baud_rate: u32) -> Result<(), TransportError> {
        if channel != SIMULATED_CHANNEL {
            return Err(TransportError::Connection(format!(
                "simulator only accepts '{}', got '{}'",
                SIMULATED_CHANNEL, channel
            )));
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn is_open(&self) -> bool {
        self.connected
    }

    fn transact(&mut self, command: &str) -> Result<String, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        let response = self.respond(command.trim());
        debug!(command, %response, "simulated transaction");
        Ok(response)
    }

    fn connection_info(&self) -> String {
        if self.connected {
            SIMULATED_CHANNEL.to_string()
        } else {
            "Disconnected".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_simulator() -> SimulatedTransport {
        let mut sim = SimulatedTransport::with_seed(42);
        sim.open(SIMULATED_CHANNEL, 115_200).unwrap();
        sim
    }

    #[test]
    fn test_open_rejects_other_channels() {
        let mut sim = SimulatedTransport::new();
        let err = sim.open("/dev/ttyUSB0", 115_200).unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        assert!(!sim.is_open());

        let err = sim.open("DEMO", 115_200).unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }

    #[test]
    fn test_transact_requires_open() {
        let mut sim = SimulatedTransport::new();
        assert!(matches!(sim.transact("AT"), Err(TransportError::NotConnected)));

        sim.open(SIMULATED_CHANNEL, 9_600).unwrap();
        sim.close();
        assert!(matches!(sim.transact("AT"), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_at_returns_ok() {
        let mut sim = open_simulator();
        assert_eq!(sim.transact("AT").unwrap(), "OK");
        assert_eq!(sim.transact("  AT \r").unwrap(), "OK");
    }

    #[test]
    fn test_ati_identity_block() {
        let mut sim = open_simulator();
        let response = sim.transact("ATI").unwrap();
        let lines: Vec<&str> = response.lines().collect();

        assert!(lines[0].starts_with("Manufacturer:"));
        assert!(lines[1].starts_with("Model:"));
        assert!(lines[2].starts_with("Revision:"));
        assert_eq!(lines.last(), Some(&"OK"));
    }

    #[test]
    fn test_error_substring_wins() {
        let mut sim = open_simulator();
        for cmd in ["ERROR", "AT+ERROR", "ATI ERROR", "AT+CSQ ERROR", "AT+CMGS=ERROR"] {
            assert_eq!(sim.transact(cmd).unwrap(), "ERROR", "command {cmd}");
        }
        // Case-sensitive
        assert_eq!(sim.transact("AT+error").unwrap(), "OK");
    }

    #[test]
    fn test_canned_responses_are_stable() {
        let mut sim = open_simulator();
        for (cmd, expected) in CANNED_RESPONSES {
            let first = sim.transact(cmd).unwrap();
            let second = sim.transact(cmd).unwrap();
            assert_eq!(first, *expected);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_signal_quality_is_bounded() {
        let mut sim = open_simulator();
        for _ in 0..200 {
            let response = sim.transact("AT+CSQ?").unwrap();
            let value = response
                .strip_prefix("+CSQ: ")
                .and_then(|rest| rest.split(',').next())
                .and_then(|rssi| rssi.parse::<u8>().ok())
                .expect("templated CSQ response");
            assert!((5..=31).contains(&value));
            assert!(response.ends_with("\nOK"));
        }
    }

    #[test]
    fn test_seeded_simulators_agree() {
        let mut a = SimulatedTransport::with_seed(9);
        let mut b = SimulatedTransport::with_seed(9);
        a.open(SIMULATED_CHANNEL, 115_200).unwrap();
        b.open(SIMULATED_CHANNEL, 115_200).unwrap();
        for _ in 0..10 {
            assert_eq!(a.transact("AT+CSQ=?").unwrap(), b.transact("AT+CSQ=?").unwrap());
        }
    }

    #[test]
    fn test_sms_prompt_and_submission() {
        let mut sim = open_simulator();
        assert_eq!(sim.transact("AT+CMGS=\"+15550100\"").unwrap(), "> ");
        assert_eq!(sim.transact("hello\u{1a}").unwrap(), "+CMGS: 42\nOK");
    }

    #[test]
    fn test_unknown_command_is_ok() {
        let mut sim = open_simulator();
        assert_eq!(sim.transact("AT+COPS?").unwrap(), "OK");
        assert_eq!(sim.transact("AT+GMR=1").unwrap(), "DEMO FW 1.2.3\nOK");
    }
}
