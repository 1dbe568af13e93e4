// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Every knob of a run, as plain serialisable structs.
// The CLI converts its argument structs into these, so nothing
// below Layer 1 ever sees a clap type. Values are handed to
// component constructors; there is no global state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::tensor::TensorNames;
use crate::error::PipelineError;

/// Default label list of the sequence classifier
pub const DEFAULT_LABELS: [&str; 7] = ["happy", "anger", "lost", "fear", "sad", "other", "anxiety"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One paragraph and one question from the command line
    #[default]
    Single,
    /// A SQuAD-style input file
    Batch,
}

impl FromStr for RunMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(RunMode::Single),
            "batch"  => Ok(RunMode::Batch),
            other    => Err(PipelineError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Single => write!(f, "single"),
            RunMode::Batch  => write!(f, "batch"),
        }
    }
}

// ─── Span QA ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    pub model_dir:         String,
    pub vocab_file:        String,
    pub max_seq_length:    usize,
    pub max_answer_length: usize,
    pub n_best_size:       usize,
    pub doc_stride:        usize,
    pub max_query_length:  usize,
    pub do_lower_case:     bool,
    pub tensor_names:      TensorNames,
    pub mode:              RunMode,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            model_dir:         "model".to_string(),
            vocab_file:        "model/vocab.txt".to_string(),
            max_seq_length:    384,
            max_answer_length: 128,
            n_best_size:       20,
            doc_stride:        128,
            max_query_length:  64,
            do_lower_case:     true,
            tensor_names:      TensorNames::default(),
            mode:              RunMode::Single,
        }
    }
}

impl QaConfig {
    /// Fail fast on settings that can never produce a window.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.doc_stride == 0 {
            return Err(PipelineError::InvalidStride);
        }
        if self.n_best_size == 0 {
            return Err(PipelineError::InvalidConfig("n_best_size must be at least 1".to_string()));
        }
        if self.max_answer_length == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_answer_length must be at least 1".to_string(),
            ));
        }
        if self.max_query_length + 3 >= self.max_seq_length {
            return Err(PipelineError::InvalidConfig(format!(
                "max_seq_length {} must exceed max_query_length {} + 3",
                self.max_seq_length, self.max_query_length
            )));
        }
        Ok(())
    }
}

// ─── Classification ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    pub model_dir:      String,
    pub vocab_file:     String,
    pub max_seq_length: usize,
    pub do_lower_case:  bool,
    pub labels:         Vec<String>,
    pub tensor_names:   TensorNames,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            model_dir:      "model".to_string(),
            vocab_file:     "model/vocab.txt".to_string(),
            max_seq_length: 128,
            do_lower_case:  true,
            labels:         DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            tensor_names:   TensorNames::default(),
        }
    }
}

impl ClassifyConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.labels.is_empty() {
            return Err(PipelineError::InvalidConfig("label list is empty".to_string()));
        }
        // [CLS] + at least one token + [SEP]
        if self.max_seq_length < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "max_seq_length {} is too short",
                self.max_seq_length
            )));
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("single".parse::<RunMode>(), Ok(RunMode::Single));
        assert_eq!("Batch".parse::<RunMode>(), Ok(RunMode::Batch));
        assert_eq!(
            "stream".parse::<RunMode>(),
            Err(PipelineError::UnsupportedMode("stream".to_string()))
        );
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = QaConfig::default();
        assert_eq!(cfg.max_seq_length, 384);
        assert_eq!(cfg.doc_stride, 128);
        assert!(cfg.validate().is_ok());
        assert!(ClassifyConfig::default().validate().is_ok());
        assert_eq!(ClassifyConfig::default().labels.len(), 7);
    }

    #[test]
    fn test_zero_stride_is_rejected() {
        let cfg = QaConfig { doc_stride: 0, ..QaConfig::default() };
        assert_eq!(cfg.validate(), Err(PipelineError::InvalidStride));
    }

    #[test]
    fn test_query_must_leave_room() {
        let cfg = QaConfig { max_seq_length: 67, max_query_length: 64, ..QaConfig::default() };
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
        let cfg = QaConfig { max_seq_length: 68, ..cfg };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_json_uses_lowercase_mode() {
        let cfg  = QaConfig { mode: RunMode::Batch, ..QaConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains(r#""mode":"batch""#));
        let back: QaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, RunMode::Batch);
    }
}
