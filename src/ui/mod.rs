//! CLI UI utilities: colored status lines, section headers and a spinner.

use owo_colors::OwoColorize;
use std::time::Duration;

use crate::models::SourceLabel;

/// Icon shown next to a result's source.
pub fn source_icon(source: &SourceLabel) -> &'static str {
    match source {
        SourceLabel::Arxiv => "📝",
        SourceLabel::Doaj => "📓",
        SourceLabel::OpenLibrary => "📚",
        SourceLabel::WebSearch => "🔎",
        SourceLabel::Other(_) => "🌐",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Format a status line with a colored icon.
pub fn status_line(status: Status, msg: &str) -> String {
    let icon = status_icon(status);
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Search => format!("{} {}", icon.yellow(), msg),
    }
}

/// Print a styled status message to stdout, errors to stderr.
pub fn print_status(status: Status, msg: &str) {
    match status {
        Status::Error | Status::Warning => eprintln!("{}", status_line(status, msg)),
        _ => println!("{}", status_line(status, msg)),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print search results header.
pub fn print_search_header(query: &str, count: usize, duration: Duration, from_cache: bool) {
    println!();
    println!(
        "{} Search results for: \"{}\"",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    let origin = if from_cache { " (cached)" } else { "" };
    println!(
        "{} Found {} documents in {:.2}s{}",
        "─".repeat(30).dimmed(),
        count.to_string().green().bold(),
        duration.as_secs_f64(),
        origin.dimmed()
    );
    println!();
}

/// Get a human-readable file size.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Loading spinner, shown while sources are queried.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for non-interactive output.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Remove the spinner from the terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_icon() {
        assert_eq!(source_icon(&SourceLabel::Arxiv), "📝");
        assert_eq!(source_icon(&SourceLabel::Other("mit.edu".into())), "🌐");
    }

    #[test]
    fn test_status_line_contains_message() {
        let line = status_line(Status::Error, "Search failed. Check your network.");
        assert!(line.contains("Search failed. Check your network."));
        assert!(line.contains(status_icon(Status::Error)));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(500), "500 B");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1048576), "1.00 MB");
    }
}
