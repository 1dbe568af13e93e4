// ============================================================
// Layer 3 — Named Tensor Batches
// ============================================================
// The scorer boundary speaks in named tensors, the way exported
// saved-model signatures do:
//
//   request:  unique_ids [N]   input_ids [N, S]
//             input_mask [N, S] segment_ids [N, S]
//   response: unique_ids [N]   start_logits [N, S] end_logits [N, S]
//
// Every name is configurable through TensorNames so a model
// exported with different signature keys can be used as is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One named tensor, rows first
#[derive(Debug, Clone, PartialEq)]
pub enum NamedTensor {
    /// Rank-1 integer tensor, e.g. feature ids
    Ids(Vec<i64>),
    /// Rank-2 integer tensor, e.g. input ids
    Int(Vec<Vec<i64>>),
    /// Rank-2 float tensor, e.g. logits
    Float(Vec<Vec<f32>>),
}

impl NamedTensor {
    /// Size of the leading (batch) dimension
    pub fn rows(&self) -> usize {
        match self {
            NamedTensor::Ids(v)   => v.len(),
            NamedTensor::Int(v)   => v.len(),
            NamedTensor::Float(v) => v.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorBatch {
    tensors: BTreeMap<String, NamedTensor>,
}

impl TensorBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: NamedTensor) -> &mut Self {
        self.tensors.insert(name.into(), tensor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.get(name)
    }

    pub fn ids(&self, name: &str) -> Option<&[i64]> {
        match self.get(name)? {
            NamedTensor::Ids(v) => Some(v),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<&[Vec<i64>]> {
        match self.get(name)? {
            NamedTensor::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<&[Vec<f32>]> {
        match self.get(name)? {
            NamedTensor::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }
}

/// Signature keys for the scorer's input and output tensors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorNames {
    pub unique_ids:    String,
    pub input_ids:     String,
    pub input_mask:    String,
    pub segment_ids:   String,
    pub start_logits:  String,
    pub end_logits:    String,
    /// Classifier output
    pub probabilities: String,
}

impl Default for TensorNames {
    fn default() -> Self {
        Self {
            unique_ids:    "unique_ids".to_string(),
            input_ids:     "input_ids".to_string(),
            input_mask:    "input_mask".to_string(),
            segment_ids:   "segment_ids".to_string(),
            start_logits:  "start_logits".to_string(),
            end_logits:    "end_logits".to_string(),
            probabilities: "probabilities".to_string(),
        }
    }
}
