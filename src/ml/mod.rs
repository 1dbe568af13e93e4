// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code, apart
// from the checkpoint recorder in infra. The rest of the crate
// only sees the Predictor trait and named-tensor batches.
//
//   model.rs      — Transformer encoder with token, position and
//                   segment embeddings, padding-masked
//                   self-attention, a span head (start / end
//                   logits per token) and a [CLS] label head
//
//   inferencer.rs — BurnPredictor: restores a SpanModel from a
//                   checkpoint and answers named-tensor requests
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

/// Transformer encoder with span and classification heads
pub mod model;

/// Checkpoint-backed scoring adapter
pub mod inferencer;
