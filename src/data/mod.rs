// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from SQuAD-style JSON all the
// way to the named-tensor request the scorer takes.
//
// The pipeline flows in this order:
//
//   JSON file / --paragraph + --question
//       │
//       ▼
//   SquadLoader / InlineSource → typed paragraph + question records
//       │
//       ▼
//   Preprocessor      → cleans text (whitespace, control chars)
//       │
//       ▼
//   read_examples     → basic tokens with byte spans → Examples
//       │
//       ▼
//   Chunker           → overlapping windows over the sub-tokens
//       │
//       ▼
//   FeatureEncoder    → [CLS] q [SEP] window [SEP], padded
//       │
//       ▼
//   batcher           → named tensors in, RawResults out
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads SQuAD-style JSON and inline questions
pub mod loader;

/// Cleans and normalises raw paragraph text
pub mod preprocessor;

/// Splits long documents into overlapping windows
pub mod chunker;

/// Encodes (example, window) pairs and text pairs into model inputs
pub mod encoder;

/// Named-tensor request / response codec
pub mod batcher;
