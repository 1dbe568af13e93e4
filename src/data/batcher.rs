// ============================================================
// Layer 4 — Scorer Request / Response Codec
// ============================================================
// Packs Features into the named-tensor batch the scorer takes,
// and unpacks its answer back into per-feature RawResults.
//
//   request:  unique_ids [N]      (features' ids)
//             input_ids  [N, S]   input_mask [N, S]   segment_ids [N, S]
//   response: unique_ids [N]      start_logits [N, S] end_logits [N, S]
//
// Because every Feature is already padded to max_seq_length,
// stacking is a plain copy: no dynamic padding here.
//
// The response is checked before use. Rows are correlated by
// id, so the scorer may reorder them, but every row must be
// max_seq_length wide and the three tensors must agree on N.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use crate::domain::feature::{Feature, PairFeature, RawResult};
use crate::domain::tensor::{NamedTensor, TensorBatch, TensorNames};
use crate::error::PipelineError;

fn widen(rows: impl Iterator<Item = Vec<u32>>) -> NamedTensor {
    NamedTensor::Int(
        rows.map(|row| row.into_iter().map(i64::from).collect())
            .collect(),
    )
}

/// Build the span-scoring request for a batch of features
pub fn span_request(features: &[Feature], names: &TensorNames) -> TensorBatch {
    let mut batch = TensorBatch::new();
    batch
        .insert(
            names.unique_ids.as_str(),
            NamedTensor::Ids(features.iter().map(|f| f.unique_id as i64).collect()),
        )
        .insert(names.input_ids.as_str(), widen(features.iter().map(|f| f.input_ids.clone())))
        .insert(names.input_mask.as_str(), widen(features.iter().map(|f| f.input_mask.clone())))
        .insert(names.segment_ids.as_str(), widen(features.iter().map(|f| f.segment_ids.clone())));
    batch
}

/// Build the classifier request; it carries no ids
pub fn pair_request(features: &[PairFeature], names: &TensorNames) -> TensorBatch {
    let mut batch = TensorBatch::new();
    batch
        .insert(names.input_ids.as_str(), widen(features.iter().map(|f| f.input_ids.clone())))
        .insert(names.input_mask.as_str(), widen(features.iter().map(|f| f.input_mask.clone())))
        .insert(names.segment_ids.as_str(), widen(features.iter().map(|f| f.segment_ids.clone())));
    batch
}

/// Decode a span-scoring response into one RawResult per row
pub fn span_results(
    response: &TensorBatch,
    names:    &TensorNames,
    seq_len:  usize,
) -> Result<Vec<RawResult>, PipelineError> {
    let ids = response
        .ids(&names.unique_ids)
        .ok_or_else(|| PipelineError::malformed(format!("missing id tensor '{}'", names.unique_ids)))?;
    let starts = float_rows(response, &names.start_logits, ids.len(), seq_len)?;
    let ends   = float_rows(response, &names.end_logits, ids.len(), seq_len)?;

    ids.iter()
        .zip(starts.iter().zip(ends))
        .map(|(&id, (start, end))| {
            let unique_id = u64::try_from(id)
                .map_err(|_| PipelineError::malformed(format!("negative feature id {id}")))?;
            Ok(RawResult {
                unique_id,
                start_logits: start.clone(),
                end_logits:   end.clone(),
            })
        })
        .collect()
}

/// Decode classifier probabilities, one row of `num_labels` per input
pub fn probability_rows(
    response:   &TensorBatch,
    names:      &TensorNames,
    rows:       usize,
    num_labels: usize,
) -> Result<Vec<Vec<f32>>, PipelineError> {
    Ok(float_rows(response, &names.probabilities, rows, num_labels)?.to_vec())
}

fn float_rows<'a>(
    response: &'a TensorBatch,
    name:     &str,
    rows:     usize,
    width:    usize,
) -> Result<&'a [Vec<f32>], PipelineError> {
    let tensor = response
        .float(name)
        .ok_or_else(|| PipelineError::malformed(format!("missing float tensor '{name}'")))?;

    if tensor.len() != rows {
        return Err(PipelineError::malformed(format!(
            "tensor '{name}' has {} rows, expected {rows}",
            tensor.len()
        )));
    }
    if let Some(bad) = tensor.iter().find(|row| row.len() != width) {
        return Err(PipelineError::malformed(format!(
            "tensor '{name}' has a row of width {}, expected {width}",
            bad.len()
        )));
    }
    Ok(tensor)
}
