// ============================================================
// Layer 5 — Burn Predictor
// ============================================================
// The in-process scoring adapter: a SpanModel restored from a
// checkpoint, answering named-tensor requests.
//
//   request has unique_ids → span scoring
//       response: unique_ids, start_logits, end_logits
//   otherwise              → sequence classification
//       response: probabilities
//
// Ids are echoed back untouched so the ranker can match rows.
use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::domain::tensor::{NamedTensor, TensorBatch, TensorNames};
use crate::domain::traits::Predictor;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::SpanModel;

pub type InferBackend = burn::backend::Wgpu;

pub struct BurnPredictor<B: Backend> {
    model:  SpanModel<B>,
    device: B::Device,
    names:  TensorNames,
}

impl<B: Backend> BurnPredictor<B> {
    pub fn new(model: SpanModel<B>, device: B::Device, names: TensorNames) -> Self {
        Self { model, device, names }
    }

    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        names:        TensorNames,
        device:       B::Device,
    ) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model = cfg.init::<B>(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from '{}' ({} layers, d_model {}, max_seq_len {})",
            ckpt_manager.dir().display(),
            cfg.num_layers,
            cfg.d_model,
            cfg.max_seq_len
        );
        Ok(Self::new(model, device, names))
    }

    /// Fails when windows of `max_seq_length` would not fit the
    /// model's position table.
    pub fn check_seq_len(&self, max_seq_length: usize) -> Result<()> {
        if max_seq_length > self.model.max_seq_len {
            anyhow::bail!(
                "max_seq_length {max_seq_length} exceeds the model's {} positions",
                self.model.max_seq_len
            );
        }
        Ok(())
    }

    fn int_input(&self, inputs: &TensorBatch, name: &str) -> Result<Tensor<B, 2, Int>> {
        let rows = inputs
            .int(name)
            .ok_or_else(|| anyhow!("request has no integer tensor '{name}'"))?;
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            anyhow::bail!("tensor '{name}' has ragged rows");
        }
        if width > self.model.max_seq_len {
            anyhow::bail!(
                "tensor '{name}' is {width} wide, model takes at most {}",
                self.model.max_seq_len
            );
        }
        let flat: Vec<i64> = rows.iter().flatten().copied().collect();
        Ok(Tensor::from_data(TensorData::new(flat, [rows.len(), width]), &self.device))
    }

    fn float_rows(tensor: Tensor<B, 2>) -> Result<Vec<Vec<f32>>> {
        let [_, width] = tensor.dims();
        let flat: Vec<f32> = tensor
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Reading model output: {e:?}"))?;
        if width == 0 {
            return Ok(Vec::new());
        }
        Ok(flat.chunks(width).map(<[f32]>::to_vec).collect())
    }
}

impl<B: Backend> Predictor for BurnPredictor<B> {
    fn predict(&self, inputs: &TensorBatch) -> Result<TensorBatch> {
        let mut response = TensorBatch::new();
        let rows = inputs.get(&self.names.input_ids).map_or(0, NamedTensor::rows);

        let unique_ids = inputs.ids(&self.names.unique_ids);
        if rows == 0 {
            // Nothing to score; answer with empty tensors of the right kind
            match unique_ids {
                Some(_) => {
                    response
                        .insert(self.names.unique_ids.as_str(), NamedTensor::Ids(Vec::new()))
                        .insert(self.names.start_logits.as_str(), NamedTensor::Float(Vec::new()))
                        .insert(self.names.end_logits.as_str(), NamedTensor::Float(Vec::new()));
                }
                None => {
                    response.insert(self.names.probabilities.as_str(), NamedTensor::Float(Vec::new()));
                }
            }
            return Ok(response);
        }

        let input_ids   = self.int_input(inputs, &self.names.input_ids)?;
        let input_mask  = self.int_input(inputs, &self.names.input_mask)?;
        let segment_ids = self.int_input(inputs, &self.names.segment_ids)?;

        match unique_ids {
            Some(ids) => {
                let out = self.model.forward(input_ids, input_mask, segment_ids);
                response
                    .insert(self.names.unique_ids.as_str(), NamedTensor::Ids(ids.to_vec()))
                    .insert(self.names.start_logits.as_str(), NamedTensor::Float(Self::float_rows(out.start_logits)?))
                    .insert(self.names.end_logits.as_str(), NamedTensor::Float(Self::float_rows(out.end_logits)?));
                tracing::debug!("Scored {} features", ids.len());
            }
            None => {
                let probs = self.model.classify(input_ids, input_mask, segment_ids);
                response.insert(self.names.probabilities.as_str(), NamedTensor::Float(Self::float_rows(probs)?));
                tracing::debug!("Classified {} inputs", rows);
            }
        }
        Ok(response)
    }
}
