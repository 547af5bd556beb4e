//! Output rendering for reported entries

use crate::core::logger::LogEntry;
use clap::ValueEnum;

/// CLI output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Render one entry for stdout
pub fn render_entry(entry: &LogEntry, format: OutputFormat, show_timestamp: bool) -> String {
    match format {
        OutputFormat::Text => entry.to_text(show_timestamp),
        OutputFormat::Json => entry.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_formats() {
        let entry = LogEntry::input("AT");
        assert_eq!(render_entry(&entry, OutputFormat::Text, false), "> AT");

        let json: serde_json::Value =
            serde_json::from_str(&render_entry(&entry, OutputFormat::Json, false)).unwrap();
        assert_eq!(json["kind"], "input");
        assert_eq!(json["text"], "AT");
    }
}
