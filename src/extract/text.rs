//! Text sanitising and title detection

use std::sync::OnceLock;

use regex::Regex;

/// Lines scanned when looking for a title
const TITLE_SCAN_LINES: usize = 10;

fn strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // NUL, C0 controls except \t \n \r, DEL, U+FFFD, private use area, specials
    RE.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F\x{FFFD}\x{E000}-\x{F8FF}\x{FFF0}-\x{FFFF}]")
            .expect("valid strip pattern")
    })
}

fn blank_run_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x{A0}]+").expect("valid blank pattern"))
}

fn repeated_punct_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?])[ \t]*[.!?]+").expect("valid punctuation pattern"))
}

fn space_before_punct_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+([.!?,:;])").expect("valid punctuation pattern"))
}

fn blank_lines_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid newline pattern"))
}

/// Sanitise extracted text
///
/// Removes characters that break downstream storage and collapses PDF
/// spacing artifacts. Line structure is kept; lines are trimmed and runs of
/// blank lines shrink to one.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned = text.replace("\r\n", "\n");
    let cleaned = strip_pattern().replace_all(&cleaned, "");
    let cleaned = blank_run_pattern().replace_all(&cleaned, " ");
    let cleaned = repeated_punct_pattern().replace_all(&cleaned, "$1");
    let cleaned = space_before_punct_pattern().replace_all(&cleaned, "$1");

    let trimmed: Vec<&str> = cleaned.split('\n').map(str::trim).collect();
    let joined = trimmed.join("\n");

    blank_lines_pattern()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Pick a document title
///
/// Prefers the info dictionary title, then the first plausible heading line
/// of the content, then `fallback` (the filename without its `.pdf` suffix).
pub fn detect_title(info_title: Option<&str>, content: &str, fallback: &str) -> String {
    if let Some(title) = info_title.map(clean_text).filter(|t| !t.is_empty()) {
        return title;
    }

    content
        .lines()
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .find(|line| is_title_line(line))
        .map(|line| line.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn is_title_line(line: &str) -> bool {
    let len = line.chars().count();
    len > 10
        && len < 100
        && !line.chars().all(|c| c.is_ascii_digit())
        && !line.contains("Page")
}

/// Non-whitespace characters in `text`
pub fn significant_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
