// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the concerns that touch the filesystem or a third
// party format:
//
//   checkpoint.rs       — Loading (and saving) model weights
//                         with Burn's CompactRecorder, plus the
//                         architecture config as JSON so the
//                         model can be rebuilt before loading.
//
//   tokenizer_store.rs  — WordPiece tokenizer built from a vocab
//                         file through the `tokenizers` crate.
//
//   prediction_store.rs — predictions.json and
//                         nbest_predictions.json writers.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint loading and saving
pub mod checkpoint;

/// Vocab-file WordPiece tokenizer
pub mod tokenizer_store;

/// Prediction output files
pub mod prediction_store;
