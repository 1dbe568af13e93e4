// ============================================================
// Layer 4 — Question Loader
// ============================================================
// Reads SQuAD-style input into typed records and turns them
// into Examples.
//
// Accepted file shapes:
//   [ { "paragraphs": [ { "context": "...",
//                         "qas": [ { "id": "...", "question": "..." } ] } ] } ]
//   { "data": [ ...same entries... ] }
//
// Records are validated here, at the boundary, so nothing past
// this module ever sees an empty id or question.
//
// Reference: SQuAD v1.1 dataset format
//            serde documentation (untagged enums)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::Preprocessor;
use crate::domain::example::Example;
use crate::domain::traits::{QuestionSource, SubwordTokenizer};

/// Id given to the question in single-pair mode
pub const SINGLE_QUESTION_ID: &str = "RANDOM_QUESTION_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadQuestion {
    pub id:       String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadParagraph {
    pub context: String,
    pub qas:     Vec<SquadQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadEntry {
    pub paragraphs: Vec<SquadParagraph>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SquadFile {
    Bare(Vec<SquadEntry>),
    Wrapped { data: Vec<SquadEntry> },
}

/// Loads a SQuAD-style JSON file (batch mode)
pub struct SquadLoader {
    path: PathBuf,
}

impl SquadLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuestionSource for SquadLoader {
    fn load_all(&self) -> Result<Vec<SquadEntry>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read input file '{}'", self.path.display()))?;

        let entries = parse_entries(&json)
            .with_context(|| format!("Invalid input file '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} questions from '{}'",
            count_questions(&entries),
            self.path.display()
        );
        Ok(entries)
    }
}

/// One paragraph and one question (single mode)
pub struct InlineSource {
    paragraph: String,
    question:  String,
}

impl InlineSource {
    pub fn new(paragraph: impl Into<String>, question: impl Into<String>) -> Self {
        Self { paragraph: paragraph.into(), question: question.into() }
    }
}

impl QuestionSource for InlineSource {
    fn load_all(&self) -> Result<Vec<SquadEntry>> {
        let entries = vec![SquadEntry {
            paragraphs: vec![SquadParagraph {
                context: self.paragraph.clone(),
                qas:     vec![SquadQuestion {
                    id:       SINGLE_QUESTION_ID.to_string(),
                    question: self.question.clone(),
                }],
            }],
        }];
        validate(&entries)?;
        Ok(entries)
    }
}

/// Parse and validate SQuAD-style JSON text
pub fn parse_entries(json: &str) -> Result<Vec<SquadEntry>> {
    let entries = match serde_json::from_str::<SquadFile>(json)? {
        SquadFile::Bare(entries)      => entries,
        SquadFile::Wrapped { data }   => data,
    };
    validate(&entries)?;
    Ok(entries)
}

fn validate(entries: &[SquadEntry]) -> Result<()> {
    for paragraph in entries.iter().flat_map(|e| &e.paragraphs) {
        for qa in &paragraph.qas {
            if qa.id.trim().is_empty() {
                anyhow::bail!("question '{}' has an empty id", qa.question);
            }
            if qa.question.trim().is_empty() {
                anyhow::bail!("question '{}' has empty text", qa.id);
            }
        }
    }
    Ok(())
}

fn count_questions(entries: &[SquadEntry]) -> usize {
    entries
        .iter()
        .flat_map(|e| &e.paragraphs)
        .map(|p| p.qas.len())
        .sum()
}

/// Normalize every paragraph once and build one Example per question.
pub fn read_examples<T: SubwordTokenizer + ?Sized>(
    entries:   &[SquadEntry],
    tokenizer: &T,
) -> Result<Vec<Example>> {
    let preprocessor = Preprocessor::new();
    let mut examples = Vec::new();

    for paragraph in entries.iter().flat_map(|e| &e.paragraphs) {
        let context    = preprocessor.clean(&paragraph.context);
        let doc_tokens = tokenizer.basic_tokenize(&context)?;

        for qa in &paragraph.qas {
            examples.push(Example::new(
                qa.id.clone(),
                qa.question.clone(),
                context.clone(),
                doc_tokens.clone(),
            ));
        }
    }

    tracing::debug!("Read {} examples", examples.len());
    Ok(examples)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::test_tokenizer;

    const SAMPLE: &str = r#"[
        { "paragraphs": [
            { "context": "The  quick\tbrown fox",
              "qas": [ { "id": "a", "question": "what fox" },
                       { "id": "b", "question": "is it quick" } ] },
            { "context": "the lazy dog",
              "qas": [ { "id": "c", "question": "who" } ] }
        ] }
    ]"#;

    #[test]
    fn test_parse_bare_array() {
        let entries = parse_entries(SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].paragraphs.len(), 2);
        assert_eq!(count_questions(&entries), 3);
    }

    #[test]
    fn test_parse_wrapped_data() {
        let wrapped = format!(r#"{{ "version": "1.1", "data": {SAMPLE} }}"#);
        let entries = parse_entries(&wrapped).unwrap();
        assert_eq!(count_questions(&entries), 3);
    }

    #[test]
    fn test_empty_question_is_rejected() {
        let bad = r#"[{ "paragraphs": [{ "context": "x", "qas": [{ "id": "a", "question": " " }] }] }]"#;
        assert!(parse_entries(bad).is_err());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let bad = r#"[{ "paragraphs": [{ "qas": [] }] }]"#;
        assert!(parse_entries(bad).is_err());
    }

    #[test]
    fn test_read_examples_normalizes_context() {
        let tok      = test_tokenizer();
        let entries  = parse_entries(SAMPLE).unwrap();
        let examples = read_examples(&entries, &tok).unwrap();

        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0].context, "The quick brown fox");
        assert_eq!(examples[0].doc_tokens, examples[1].doc_tokens);
        assert_eq!(examples[1].qas_id, "b");
        assert_eq!(examples[2].doc_tokens.len(), 3);
    }

    #[test]
    fn test_inline_source_uses_fixed_id() {
        let entries = InlineSource::new("the dog", "who").load_all().unwrap();
        assert_eq!(entries[0].paragraphs[0].qas[0].id, SINGLE_QUESTION_ID);
    }

    #[test]
    fn test_loader_reports_missing_file() {
        let loader = SquadLoader::new("/definitely/not/here.json");
        let err    = loader.load_all().unwrap_err();
        assert!(err.to_string().contains("Cannot read input file"));
    }
}
