// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans raw paragraph text before it is tokenized and windowed.
//
// Cleaning steps (applied in order):
//   1. Drop NUL, U+FFFD and every Unicode "Other" (C*) character
//      except tab, newline and carriage return
//   2. Map space, tab, CR, LF and narrow no-break space (U+202F)
//      to a plain ASCII space
//   3. Re-split on whitespace and re-join with single spaces,
//      so no run of spaces survives and the ends are trimmed
//
// Pure and deterministic: the same input always gives the same
// output and nothing else is touched.
//
// Reference: Rust Book §8 (Strings in Rust)
//            regex crate documentation (Unicode classes)

use once_cell::sync::Lazy;
use regex::Regex;

static INVALID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00\x{FFFD}]|[\p{C}&&[^\t\n\r]]").expect("invalid-char pattern")
});

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{202F}')
}

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw paragraph into single-spaced text.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: remove invalid and control characters ────────────────────
        let stripped = INVALID_RE.replace_all(text, "");

        // ── Step 2: whitespace class → ASCII space ────────────────────────────
        let spaced: String = stripped
            .chars()
            .map(|c| if is_whitespace(c) { ' ' } else { c })
            .collect();

        // ── Step 3: collapse runs and trim ────────────────────────────────────
        spaced.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_whitespace_class_becomes_single_space() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("a\tb\r\nc\u{202F}d"), "a b c d");
    }

    #[test]
    fn test_removes_control_and_replacement_chars() {
        let p = Preprocessor::new();
        // \x01 and U+FFFD vanish without leaving a gap
        assert_eq!(p.clean("hel\x01lo\u{FFFD} wor\0ld"), "hello world");
    }

    #[test]
    fn test_removes_format_characters() {
        let p = Preprocessor::new();
        // Zero-width joiner and BOM are category Cf
        assert_eq!(p.clean("\u{FEFF}ab\u{200D}c"), "abc");
    }

    #[test]
    fn test_keeps_cjk_text_intact() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  电子商务法\n\n已实施 "), "电子商务法 已实施");
    }

    #[test]
    fn test_no_double_spaces_survive() {
        let p   = Preprocessor::new();
        let out = p.clean("a \u{0007} \t\n b");
        assert!(!out.contains("  "));
        assert_eq!(out, "a b");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
