// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of span prediction.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A question over one paragraph, with provenance-bearing tokens
pub mod example;

// Windows over the document and the encoded model inputs
pub mod feature;

// Ranked candidate answers
pub mod prediction;

// Named-tensor batches exchanged with the scorer
pub mod tensor;

// Collaborator abstractions
pub mod traits;
