// ============================================================
// Layer 3 — Example Domain Type
// ============================================================
// One (paragraph, question) pair to answer.
//
// The paragraph is kept twice: once as the normalized context
// string, and once as the ordered list of basic (pre-subword)
// tokens cut from it. Each token remembers its byte span in
// the context so a token range can be mapped back onto the
// un-normalized surface text:
//
//   context:    "Steve Smith's car"
//   doc_tokens: steve[0..5] smith[6..11] '[11..12] s[12..13] car[14..17]
//   tokens 0..=1 → "Steve Smith"
//
// Reference: Rust Book §5 (Structs), §8 (Strings)

use serde::{Deserialize, Serialize};

/// A basic-tokenizer token and where it came from in the context.
/// `start..end` is a byte range into `Example::context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocToken {
    pub text:  String,
    pub start: usize,
    pub end:   usize,
}

impl DocToken {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self { text: text.into(), start, end }
    }
}

/// A question over one paragraph. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    /// Opaque question identifier from the input file
    pub qas_id: String,

    pub question_text: String,

    /// Normalized paragraph text the doc tokens point into
    pub context: String,

    pub doc_tokens: Vec<DocToken>,
}

impl Example {
    pub fn new(
        qas_id:        impl Into<String>,
        question_text: impl Into<String>,
        context:       impl Into<String>,
        doc_tokens:    Vec<DocToken>,
    ) -> Self {
        Self {
            qas_id:        qas_id.into(),
            question_text: question_text.into(),
            context:       context.into(),
            doc_tokens,
        }
    }

    /// Surface text covered by doc tokens `first..=last`, including
    /// whatever whitespace and punctuation sat between them.
    /// Returns None for an empty or out-of-range token range.
    pub fn original_text(&self, first: usize, last: usize) -> Option<&str> {
        if last < first {
            return None;
        }
        let start = self.doc_tokens.get(first)?.start;
        let end   = self.doc_tokens.get(last)?.end;
        self.context.get(start..end)
    }
}
