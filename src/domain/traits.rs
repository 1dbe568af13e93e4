// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline talks to three collaborators it does not own:
//
//   QuestionSource   → where paragraphs and questions come from
//   SubwordTokenizer → basic + WordPiece tokenization, vocab lookup
//   Predictor        → the opaque model behind a named-tensor call
//
// Programming against these traits keeps the windowing, ranking
// and re-alignment logic testable without a vocabulary file or
// a GPU: tests plug in an in-memory vocab and a mocked predictor.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::data::loader::SquadEntry;
use crate::domain::example::DocToken;
use crate::domain::tensor::TensorBatch;

// ─── QuestionSource ──────────────────────────────────────────────────────────
/// Anything that can produce SQuAD-style paragraph/question records.
///
/// Implementations:
///   - SquadLoader  → a JSON file (batch mode)
///   - InlineSource → one paragraph and one question (single mode)
pub trait QuestionSource {
    fn load_all(&self) -> Result<Vec<SquadEntry>>;
}

// ─── SubwordTokenizer ────────────────────────────────────────────────────────
/// Tokenization capability consumed by the encoder and re-aligner.
pub trait SubwordTokenizer {
    /// Full sub-word tokenization; continuation pieces carry a `##` prefix
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Vocabulary lookup, unknown tokens map to the `[UNK]` id
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32>;

    /// Whitespace/punctuation split before sub-word segmentation.
    /// Each token carries its byte span in `text`.
    fn basic_tokenize(&self, text: &str) -> Result<Vec<DocToken>>;
}

// ─── Predictor ───────────────────────────────────────────────────────────────
/// The scoring adapter: one synchronous call per batch.
/// Output rows are matched to inputs by id, not by order.
pub trait Predictor {
    fn predict(&self, inputs: &TensorBatch) -> Result<TensorBatch>;
}
