//! Terminal display utilities for CLI output.
//!
//! Width handling is unicode-aware so titles in any script line up in
//! tables.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::sync::OnceLock;
use terminal_size::terminal_size;
use unicode_width::UnicodeWidthChar;

use crate::models::DocumentRecord;
use crate::ui::source_icon;
use crate::utils::history::HistoryEntry;

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Terminal information with cached size and capabilities.
#[derive(Debug, Clone)]
pub struct Terminal {
    width: usize,
    is_tty: bool,
}

static TERMINAL_INFO: OnceLock<Terminal> = OnceLock::new();

/// Get the global terminal information, initialized on first call.
pub fn terminal_info() -> &'static Terminal {
    TERMINAL_INFO.get_or_init(|| Terminal {
        width: terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(DEFAULT_WIDTH),
        is_tty: io::stdout().is_terminal(),
    })
}

/// Get the current terminal width in characters.
#[inline]
pub fn terminal_width() -> usize {
    terminal_info().width
}

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    terminal_info().is_tty
}

/// Truncate text to a display width, appending `...` when cut.
///
/// The result never exceeds `max_width`; below four columns there is no
/// room for text and only dots are returned.
///
/// # Examples
///
/// ```
/// use free_pdf_search::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(1)).sum();
    if total <= max_width {
        return text.to_string();
    }
    if max_width < 4 {
        return ".".repeat(max_width);
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(1);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    format!("{}...", out)
}

/// Widths of the (title, source, url) columns for a terminal width
///
/// Source gets a fixed slot; the remaining space is split 3:2 between title
/// and URL, never below their minimums.
pub fn document_table_columns(terminal_width: usize) -> (usize, usize, usize) {
    const SOURCE: usize = 16;
    const MIN_TITLE: usize = 20;
    const MIN_URL: usize = 20;
    // Borders and padding of a four-column UTF8 table
    const CHROME: usize = 13;

    let rest = terminal_width.saturating_sub(SOURCE + CHROME + 4);
    let title = (rest * 3 / 5).max(MIN_TITLE);
    let url = rest.saturating_sub(title).max(MIN_URL);
    (title, SOURCE, url)
}

/// Render documents as a numbered table
pub fn documents_table(documents: &[DocumentRecord], terminal_width: usize) -> Table {
    let (title_w, source_w, url_w) = document_table_columns(terminal_width);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["#", "Title", "Source", "URL"]);

    for (i, doc) in documents.iter().enumerate() {
        let marker = if doc.is_direct_pdf() { " [PDF]" } else { "" };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate_with_ellipsis(&doc.title, title_w)).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(
                &format!("{} {}{}", source_icon(&doc.source), doc.source, marker),
                source_w,
            )),
            Cell::new(truncate_with_ellipsis(&doc.url, url_w)),
        ]);
    }

    table
}

/// Render documents as plain text blocks
pub fn documents_plain(documents: &[DocumentRecord]) -> String {
    let mut out = String::new();
    for (i, doc) in documents.iter().enumerate() {
        out.push_str(&format!("{}. {} ({})\n", i + 1, doc.title, doc.source));
        out.push_str(&format!("   URL: {}\n", doc.url));
        if let Some(snippet) = &doc.snippet {
            out.push_str(&format!("   {}\n", snippet));
        }
        out.push('\n');
    }
    out
}

/// Render history entries as a table
pub fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_header(vec!["#", "Query", "Searched"]);

    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.query),
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    table
}
