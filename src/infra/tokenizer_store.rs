// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds a BERT-style WordPiece tokenizer from a plain vocab
// file (one token per line, line number = token id).
//
// Rather than wiring the tokenizers builder types together, we
// write the tokenizer description as HuggingFace JSON and load
// it, the same format Tokenizer::from_file() reads:
//
//   normalizer:    BertNormalizer (clean text, CJK spacing,
//                  optional lowercase + accent stripping)
//   pre_tokenizer: BertPreTokenizer (whitespace + punctuation)
//   model:         WordPiece, "##" continuation prefix, [UNK]
//
// basic_tokenize() runs only the normalizer and pre-tokenizer,
// which is what the document tokens of an Example are made of.
//
// Reference: Schuster & Nakajima (2012) WordPiece
//            tokenizers crate documentation

use std::{fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use tokenizers::{Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer};

use crate::domain::example::DocToken;
use crate::domain::traits::SubwordTokenizer;
use crate::error::PipelineError;

pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";

/// Continuation marker on non-initial word pieces
pub const CONTINUATION_PREFIX: &str = "##";

const MAX_INPUT_CHARS_PER_WORD: usize = 100;

pub struct WordpieceTokenizer {
    tokenizer: Tokenizer,
    unk_id:    u32,
}

impl WordpieceTokenizer {
    /// Load a vocab file, one token per line
    pub fn from_file(path: impl AsRef<Path>, do_lower_case: bool) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocab file '{}'", path.display()))?;

        let tokenizer = Self::from_vocab(text.lines(), do_lower_case)?;
        tracing::info!(
            "Loaded vocabulary from '{}' (lower_case={})",
            path.display(),
            do_lower_case
        );
        Ok(tokenizer)
    }

    /// Build from an in-memory token list; position = id
    pub fn from_vocab<I, S>(tokens: I, do_lower_case: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = serde_json::Map::new();
        for (id, token) in tokens.into_iter().enumerate() {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            // Later duplicates win, like a dict built line by line
            vocab.insert(token.to_string(), serde_json::json!(id));
        }

        let unk_id = vocab
            .get(UNK_TOKEN)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| PipelineError::tokenizer(format!("vocabulary has no {UNK_TOKEN} entry")))?
            as u32;

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": do_lower_case
            },
            "pre_tokenizer": {
                "type": "BertPreTokenizer"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordPiece",
                "unk_token": UNK_TOKEN,
                "continuing_subword_prefix": CONTINUATION_PREFIX,
                "max_input_chars_per_word": MAX_INPUT_CHARS_PER_WORD,
                "vocab": vocab
            }
        });

        let tokenizer = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow::anyhow!("Cannot build WordPiece tokenizer: {e}"))?;

        tracing::debug!("WordPiece tokenizer ready ({} entries)", tokenizer.get_vocab_size(false));
        Ok(Self { tokenizer, unk_id })
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(false)
    }
}

impl SubwordTokenizer for WordpieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(PipelineError::tokenizer)?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.tokenizer.token_to_id(t).unwrap_or(self.unk_id))
            .collect()
    }

    fn basic_tokenize(&self, text: &str) -> Result<Vec<DocToken>> {
        let mut pretokenized = PreTokenizedString::from(text);

        if let Some(normalizer) = self.tokenizer.get_normalizer() {
            pretokenized
                .normalize(|s| normalizer.normalize(s))
                .map_err(PipelineError::tokenizer)?;
        }
        if let Some(pre_tokenizer) = self.tokenizer.get_pre_tokenizer() {
            pre_tokenizer
                .pre_tokenize(&mut pretokenized)
                .map_err(PipelineError::tokenizer)?;
        }

        // Byte offsets against the un-normalized input
        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(piece, (start, end), _)| DocToken::new(piece, start, end))
            .collect())
    }
}

/// Small in-memory vocabulary shared by unit tests across layers
#[cfg(test)]
pub fn test_tokenizer() -> WordpieceTokenizer {
    const VOCAB: &[&str] = &[
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]",
        "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog",
        "what", "is", "it", "who", "owns", "car", "steve", "smith",
        "'", "s", "un", "##believ", "##able", "a", "man", "went", "to",
        "store", "and", "bought", "gallon", "of", "milk", ".", ",", "?",
        "cafe", "电", "子", "商", "务", "法",
    ];
    WordpieceTokenizer::from_vocab(VOCAB.iter(), true).expect("test vocabulary")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[DocToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_wordpiece_splits_with_continuation_marker() {
        let tok = test_tokenizer();
        assert_eq!(tok.tokenize("Unbelievable").unwrap(), vec!["un", "##believ", "##able"]);
    }

    #[test]
    fn test_unknown_word_becomes_unk() {
        let tok = test_tokenizer();
        assert_eq!(tok.tokenize("the zebra").unwrap(), vec!["the", "[UNK]"]);
    }

    #[test]
    fn test_ids_follow_line_numbers() {
        let tok = test_tokenizer();
        let ids = tok.convert_tokens_to_ids(&[
            "[PAD]".to_string(),
            "[CLS]".to_string(),
            "the".to_string(),
            "not-in-vocab".to_string(),
        ]);
        assert_eq!(ids, vec![0, 2, 5, 1]);
    }

    #[test]
    fn test_basic_tokenize_tracks_byte_spans() {
        let tok    = test_tokenizer();
        let tokens = tok.basic_tokenize("Steve Smith's car").unwrap();
        assert_eq!(texts(&tokens), vec!["steve", "smith", "'", "s", "car"]);
        assert_eq!(tokens[1].start, 6);
        assert_eq!(tokens[1].end, 11);
        assert_eq!(tokens[4].start, 14);
        assert_eq!(tokens[4].end, 17);
    }

    #[test]
    fn test_basic_tokenize_splits_cjk_characters() {
        let tok    = test_tokenizer();
        let tokens = tok.basic_tokenize("电子商务法").unwrap();
        assert_eq!(texts(&tokens), vec!["电", "子", "商", "务", "法"]);
        // Each CJK character is three bytes in UTF-8
        assert_eq!((tokens[2].start, tokens[2].end), (6, 9));
    }

    #[test]
    fn test_basic_tokenize_offsets_survive_accent_stripping() {
        let tok    = test_tokenizer();
        let text   = "Café";
        let tokens = tok.basic_tokenize(text).unwrap();
        assert_eq!(texts(&tokens), vec!["cafe"]);
        assert_eq!(&text[tokens[0].start..tokens[0].end], "Café");
    }

    #[test]
    fn test_vocab_without_unk_is_rejected() {
        assert!(WordpieceTokenizer::from_vocab(["[PAD]", "the"], true).is_err());
    }

    #[test]
    fn test_from_file_reads_one_token_per_line() {
        let path = std::env::temp_dir().join(format!("span_qa_vocab_{}.txt", std::process::id()));
        fs::write(&path, "[PAD]\n[UNK]\n[CLS]\n[SEP]\nhello\n").unwrap();

        let tok = WordpieceTokenizer::from_file(&path, true).unwrap();
        assert_eq!(tok.vocab_size(), 5);
        assert_eq!(tok.convert_tokens_to_ids(&["hello".to_string()]), vec![4]);

        fs::remove_file(&path).ok();
    }
}
