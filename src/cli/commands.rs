// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `answer` and `classify`, and
// all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, bool, RunMode)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::str::FromStr;

use clap::{ArgAction, Args, Subcommand};

use crate::application::config::{ClassifyConfig, QaConfig, RunMode, DEFAULT_LABELS};
use crate::domain::tensor::TensorNames;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract answer spans from paragraphs
    Answer(AnswerArgs),

    /// Label a text (or text pair) with the classifier head
    Classify(ClassifyArgs),
}

/// Signature keys of the exported model, for models that
/// were saved with non-default tensor names
#[derive(Args, Debug, Clone)]
pub struct TensorNameArgs {
    #[arg(long, default_value = "unique_ids")]
    pub unique_ids_name: String,

    #[arg(long, default_value = "input_ids")]
    pub input_ids_name: String,

    #[arg(long, default_value = "input_mask")]
    pub input_mask_name: String,

    #[arg(long, default_value = "segment_ids")]
    pub segment_ids_name: String,

    #[arg(long, default_value = "start_logits")]
    pub start_logits_name: String,

    #[arg(long, default_value = "end_logits")]
    pub end_logits_name: String,

    #[arg(long, default_value = "probabilities")]
    pub probabilities_name: String,
}

impl From<TensorNameArgs> for TensorNames {
    fn from(a: TensorNameArgs) -> Self {
        TensorNames {
            unique_ids:    a.unique_ids_name,
            input_ids:     a.input_ids_name,
            input_mask:    a.input_mask_name,
            segment_ids:   a.segment_ids_name,
            start_logits:  a.start_logits_name,
            end_logits:    a.end_logits_name,
            probabilities: a.probabilities_name,
        }
    }
}

/// All arguments for the `answer` command
#[derive(Args, Debug, Clone)]
pub struct AnswerArgs {
    /// `single` (--paragraph/--question) or `batch` (--input)
    #[arg(long, default_value = "single", value_parser = RunMode::from_str)]
    pub mode: RunMode,

    /// Paragraph to search (single mode)
    #[arg(long)]
    pub paragraph: Option<String>,

    /// Question to answer (single mode)
    #[arg(long)]
    pub question: Option<String>,

    /// SQuAD-style JSON file (batch mode)
    #[arg(long)]
    pub input: Option<String>,

    /// Write predictions.json and nbest_predictions.json here
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Directory holding model_config.json and model.mpk
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// WordPiece vocabulary, one token per line
    #[arg(long, default_value = "model/vocab.txt")]
    pub vocab_file: String,

    /// Total tokens per window: [CLS] question [SEP] doc [SEP] + padding
    #[arg(long, default_value_t = 384)]
    pub max_seq_length: usize,

    /// Longest answer, in sub-tokens
    #[arg(long, default_value_t = 128)]
    pub max_answer_length: usize,

    /// Candidates kept per question
    #[arg(long, default_value_t = 20)]
    pub n_best_size: usize,

    /// Largest step between consecutive windows of a long paragraph
    #[arg(long, default_value_t = 128)]
    pub doc_stride: usize,

    /// Questions longer than this are truncated
    #[arg(long, default_value_t = 64)]
    pub max_query_length: usize,

    /// Lowercase and strip accents before WordPiece
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub do_lower_case: bool,

    #[command(flatten)]
    pub tensor_names: TensorNameArgs,
}

/// Convert CLI AnswerArgs into the application-layer QaConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<AnswerArgs> for QaConfig {
    fn from(a: AnswerArgs) -> Self {
        QaConfig {
            model_dir:         a.model_dir,
            vocab_file:        a.vocab_file,
            max_seq_length:    a.max_seq_length,
            max_answer_length: a.max_answer_length,
            n_best_size:       a.n_best_size,
            doc_stride:        a.doc_stride,
            max_query_length:  a.max_query_length,
            do_lower_case:     a.do_lower_case,
            tensor_names:      a.tensor_names.into(),
            mode:              a.mode,
        }
    }
}

/// All arguments for the `classify` command
#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Text to classify; repeat the flag for a batch
    #[arg(long = "text", required = true)]
    pub texts: Vec<String>,

    /// Second sequence, paired with every text
    #[arg(long)]
    pub pair: Option<String>,

    /// Comma-separated label list, in model output order
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_LABELS.map(String::from))]
    pub labels: Vec<String>,

    #[arg(long, default_value = "model")]
    pub model_dir: String,

    #[arg(long, default_value = "model/vocab.txt")]
    pub vocab_file: String,

    #[arg(long, default_value_t = 128)]
    pub max_seq_length: usize,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub do_lower_case: bool,

    #[command(flatten)]
    pub tensor_names: TensorNameArgs,
}

impl From<ClassifyArgs> for ClassifyConfig {
    fn from(a: ClassifyArgs) -> Self {
        ClassifyConfig {
            model_dir:      a.model_dir,
            vocab_file:     a.vocab_file,
            max_seq_length: a.max_seq_length,
            do_lower_case:  a.do_lower_case,
            labels:         a.labels,
            tensor_names:   a.tensor_names.into(),
        }
    }
}
