// ============================================================
// Pipeline Errors
// ============================================================
// Typed failures for the span-prediction pipeline.
//
// Everything here is a precondition violation: a configuration
// or contract error that aborts the run. Recoverable situations
// (alignment misses, empty candidate sets) are not errors and
// never show up in this enum.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The question leaves no room for document tokens in the window
    #[error(
        "max_seq_length {max_seq_length} leaves no document budget \
         after {query_tokens} question tokens and 3 special tokens"
    )]
    WindowBudget {
        max_seq_length: usize,
        query_tokens:   usize,
    },

    /// A doc_stride of zero would never advance the window
    #[error("doc_stride must be at least 1")]
    InvalidStride,

    #[error("unsupported mode '{0}' (expected 'single' or 'batch')")]
    UnsupportedMode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The scorer returned no logits for a feature we sent it
    #[error("no scoring result for feature {0}")]
    MissingResult(u64),

    #[error("malformed scorer response: {0}")]
    MalformedResponse(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

impl PipelineError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        PipelineError::MalformedResponse(msg.into())
    }

    pub fn tokenizer(msg: impl std::fmt::Display) -> Self {
        PipelineError::Tokenizer(msg.to_string())
    }
}
