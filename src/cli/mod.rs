// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `answer`   — extract answer spans, single or batch mode
//   2. `classify` — label texts with the [CLS] head
//
// This is also where the concrete collaborators are chosen:
// the vocab-file tokenizer and the Burn model on Wgpu.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{AnswerArgs, ClassifyArgs, Commands};

use crate::application::{
    answer_use_case::AnswerUseCase,
    classify_use_case::ClassifyUseCase,
    config::{ClassifyConfig, QaConfig, RunMode},
};
use crate::data::loader::{InlineSource, SquadLoader};
use crate::domain::{tensor::TensorNames, traits::QuestionSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    prediction_store::PredictionWriter,
    tokenizer_store::WordpieceTokenizer,
};
use crate::ml::inferencer::{BurnPredictor, InferBackend};

#[derive(Parser, Debug)]
#[command(
    name = "span-qa",
    version = "0.1.0",
    about = "Extractive question answering over paragraphs with a BERT-style span model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Routing only.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Answer(args)   => run_answer(args),
            Commands::Classify(args) => run_classify(args),
        }
    }
}

fn load_predictor(
    model_dir:      &str,
    names:          TensorNames,
    max_seq_length: usize,
) -> Result<BurnPredictor<InferBackend>> {
    let ckpt      = CheckpointManager::new(model_dir);
    let predictor = BurnPredictor::from_checkpoint(&ckpt, names, Default::default())?;
    predictor.check_seq_len(max_seq_length)?;
    Ok(predictor)
}

fn run_answer(args: AnswerArgs) -> Result<()> {
    let source: Box<dyn QuestionSource> = match args.mode {
        RunMode::Single => match (&args.paragraph, &args.question) {
            (Some(p), Some(q)) => Box::new(InlineSource::new(p.as_str(), q.as_str())),
            _ => bail!("single mode needs --paragraph and --question"),
        },
        RunMode::Batch => match &args.input {
            Some(path) => Box::new(SquadLoader::new(path)),
            None       => bail!("batch mode needs --input"),
        },
    };
    let output_dir = args.output_dir.clone();

    // Convert CLI args → application config (separates presentation from domain)
    let config: QaConfig = args.into();
    config.validate()?;
    tracing::info!("Answering in {} mode with model '{}'", config.mode, config.model_dir);

    let tokenizer = WordpieceTokenizer::from_file(&config.vocab_file, config.do_lower_case)?;
    let predictor = load_predictor(&config.model_dir, config.tensor_names.clone(), config.max_seq_length)?;

    let use_case    = AnswerUseCase::new(config, tokenizer, predictor)?;
    let predictions = use_case.run(source.as_ref())?;

    for p in &predictions {
        println!("{}\t{}", p.qas_id, p.answer);
    }

    if let Some(dir) = output_dir {
        PredictionWriter::new(dir).write(&predictions)?;
    }
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let texts = args.texts.clone();
    let pair  = args.pair.clone();

    let config: ClassifyConfig = args.into();
    config.validate()?;

    let tokenizer = WordpieceTokenizer::from_file(&config.vocab_file, config.do_lower_case)?;
    let predictor = load_predictor(&config.model_dir, config.tensor_names.clone(), config.max_seq_length)?;

    let use_case = ClassifyUseCase::new(config, tokenizer, predictor)?;
    for c in use_case.classify(&texts, pair.as_deref())? {
        println!("{}\t{}", c.guid, c.label);
    }
    Ok(())
}
