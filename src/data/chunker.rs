// ============================================================
// Layer 4 — Window Builder
// ============================================================
// Splits a sub-tokenized document into overlapping DocSpans that
// fit the model's input budget next to the question.
//
// Budget per window:
//   B = max_seq_length - question_tokens - 3
//   (one [CLS] and two [SEP] markers)
//
// Example with B=5, doc_stride=3, 12 tokens:
//   Doc:    the man went to the store and bought a gallon of milk
//   Span 0: the man went to the            (0..5)
//   Span 1: to the store and bought        (3..8)
//   Span 2: and bought a gallon of         (6..11)
//   Span 3: gallon of milk                 (9..12, reaches the end)
//
// A token seen by several windows is scored in all of them, but
// only the window where it has the most balanced context counts.
// "bought" sits at the right edge of span 1 (4 left, 0 right) and
// near the middle of span 2 (1 left, 3 right): span 2 wins.
//
// Reference: Devlin et al. (2019) BERT paper - sliding window approach
//            Rust Book §8 (Slices)

use crate::domain::feature::DocSpan;
use crate::error::PipelineError;

/// Reserved positions: [CLS], [SEP], [SEP]
pub const SPECIAL_TOKEN_SLOTS: usize = 3;

pub struct Chunker {
    /// Maximum number of document sub-tokens per window
    max_tokens_for_doc: usize,
    /// Largest step between consecutive window starts
    doc_stride: usize,
}

impl Chunker {
    /// Both sizes must be at least 1, otherwise the window
    /// would never advance.
    pub fn new(max_tokens_for_doc: usize, doc_stride: usize) -> Result<Self, PipelineError> {
        if doc_stride == 0 {
            return Err(PipelineError::InvalidStride);
        }
        if max_tokens_for_doc == 0 {
            return Err(PipelineError::InvalidConfig(
                "document window budget must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_tokens_for_doc, doc_stride })
    }

    /// Build a chunker for a question of `query_tokens` sub-tokens.
    /// Fails fast when the question leaves no room for the document.
    pub fn for_query(
        max_seq_length: usize,
        query_tokens:   usize,
        doc_stride:     usize,
    ) -> Result<Self, PipelineError> {
        let budget = max_seq_length
            .checked_sub(query_tokens + SPECIAL_TOKEN_SLOTS)
            .filter(|&b| b >= 1)
            .ok_or(PipelineError::WindowBudget { max_seq_length, query_tokens })?;
        Self::new(budget, doc_stride)
    }

    pub fn max_tokens_for_doc(&self) -> usize {
        self.max_tokens_for_doc
    }

    /// Cover `num_tokens` document sub-tokens with overlapping windows,
    /// ordered by ascending start. An empty document gives no windows.
    pub fn spans(&self, num_tokens: usize) -> Vec<DocSpan> {
        let mut spans = Vec::new();
        let mut start = 0usize;

        while start < num_tokens {
            let length = (num_tokens - start).min(self.max_tokens_for_doc);
            spans.push(DocSpan::new(start, length));

            // A window ending on the last token is the final one
            if start + length == num_tokens {
                break;
            }
            start += length.min(self.doc_stride);
        }

        spans
    }
}

/// Is `doc_spans[cur_span_index]` the max-context window for `position`?
///
/// Context score = min(left, right) + 0.01 * span length; the first
/// window with the strictly highest score wins.
pub fn is_max_context(doc_spans: &[DocSpan], cur_span_index: usize, position: usize) -> bool {
    let mut best_score: Option<f64> = None;
    let mut best_span_index = None;

    for (span_index, span) in doc_spans.iter().enumerate() {
        if !span.contains(position) {
            continue;
        }
        let left  = position - span.start;
        let right = span.end() - 1 - position;
        let score = left.min(right) as f64 + 0.01 * span.length as f64;

        if best_score.map_or(true, |best| score > best) {
            best_score      = Some(score);
            best_span_index = Some(span_index);
        }
    }

    best_span_index == Some(cur_span_index)
}
