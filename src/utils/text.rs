//! Text normalization helpers shared by the source adapters.

/// Character budget for snippets from the free sources
pub const SNIPPET_CHARS: usize = 150;

/// Character budget for the AI fallback snippet
pub const AI_SNIPPET_CHARS: usize = 160;

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
///
/// Counts characters, not bytes, so multi-byte text never splits inside a
/// code point. Text that already fits is returned trimmed and unmarked.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed, whitespace-collapsed text, or `None` when nothing is left
pub fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(collapse_whitespace).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_snippet("  short abstract ", 150), "short abstract");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(200);
        let snippet = truncate_snippet(&text, 150);
        assert_eq!(snippet.chars().count(), 153);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars() {
        let text = "é".repeat(10);
        assert_eq!(truncate_snippet(&text, 4), "éééé...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("Quantum\n   Error  Correction"),
            "Quantum Error Correction"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" Title ")), Some("Title".to_string()));
    }
}
