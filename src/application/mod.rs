// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (answering questions or labelling text).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Use cases are generic over the tokenizer and the predictor,
// so the CLI plugs in the real ones and tests plug in mocks.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Run configuration and mode parsing
pub mod config;

// Span question answering
pub mod answer_use_case;

// Single-sequence / sequence-pair classification
pub mod classify_use_case;
