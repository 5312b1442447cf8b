//! CLI presenter for output formatting

use colored::*;

use crate::domain::paste::PasteData;

/// Presenter for CLI output formatting
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (command results)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print daemon status
    pub fn daemon_status(&self, state: &str) {
        eprintln!("{} Daemon: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print every record's text projection, one per line
    pub fn paste_data(&self, data: &PasteData) {
        for line in Self::format_records(data) {
            println!("{}", line);
        }
    }

    fn format_records(data: &PasteData) -> Vec<String> {
        data.records()
            .iter()
            .map(|record| format!("{}\t{}", record.mime_type(), record.convert_to_text()))
            .collect()
    }

    /// Line printed by `watch` for each change
    pub fn change(&self, data: Option<&PasteData>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        match data {
            Some(data) => println!(
                "{} changed: {} record(s), {} bytes",
                stamp.to_string().dimmed(),
                data.record_count(),
                data.data_size()
            ),
            None => println!("{} changed: cleared", stamp.to_string().dimmed()),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_tab_separated() {
        let mut data = PasteData::html("<b>x</b>");
        data.add_text_record("x");

        let lines = Presenter::format_records(&data);

        assert_eq!(lines, vec!["text/html\t<b>x</b>", "text/plain\tx"]);
    }

    #[test]
    fn empty_data_prints_nothing() {
        assert!(Presenter::format_records(&PasteData::new()).is_empty());
    }
}
