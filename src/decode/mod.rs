// ============================================================
// Layer 5 — Decode Layer
// ============================================================
// Turns scorer logits back into answer text.
//
//   ranker    → top-n start/end pairs, filtered and deduplicated
//   realigner → maps normalized text back onto the paragraph
//
// Nothing here touches the model or the filesystem.

pub mod ranker;
pub mod realigner;

/// Numerically stable softmax: the max score is subtracted
/// before exponentiating, so large logits cannot overflow.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let Some(max) = scores.iter().copied().reduce(f64::max) else {
        return Vec::new();
    };

    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let total: f64     = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
