// ============================================================
// Layer 5 — Text Re-aligner
// ============================================================
// Projects a predicted answer, rebuilt from word pieces, back
// onto the original surface text.
//
// The predicted text is normalized (lowercased, accents gone,
// punctuation split off), so it can't be returned as is; the
// original token range may carry extra characters we don't
// want. For example:
//
//   predicted: steve smith
//   original:  Steve Smith's
//   wanted:    Steve Smith
//
// Heuristic: re-tokenize the original text, find the prediction
// in that comparison string, and map character offsets through
// the whitespace-free versions of both strings, assuming they
// line up one-to-one. If any step fails the original text is
// returned untouched; this is a best-effort alignment.
//
// All offsets here are char offsets, not byte offsets.

use crate::domain::traits::SubwordTokenizer;
use crate::infra::tokenizer_store::CONTINUATION_PREFIX;

/// Join word pieces with spaces and glue continuation pieces
/// onto their predecessor: ["un", "##believ", "##able"] → "unbelievable"
pub fn detokenize(tokens: &[String]) -> String {
    let joined = tokens.join(" ");
    let glued  = joined
        .replace(&format!(" {CONTINUATION_PREFIX}"), "")
        .replace(CONTINUATION_PREFIX, "");
    glued.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop spaces; return the remaining chars and, for each, its
/// index in the input
fn strip_spaces(text: &[char]) -> (Vec<char>, Vec<usize>) {
    let mut ns_chars   = Vec::with_capacity(text.len());
    let mut ns_to_s_map = Vec::with_capacity(text.len());
    for (i, &c) in text.iter().enumerate() {
        if c == ' ' {
            continue;
        }
        ns_to_s_map.push(i);
        ns_chars.push(c);
    }
    (ns_chars, ns_to_s_map)
}

pub struct Realigner<'t, T: SubwordTokenizer + ?Sized> {
    tokenizer: &'t T,
}

impl<'t, T: SubwordTokenizer + ?Sized> Realigner<'t, T> {
    pub fn new(tokenizer: &'t T) -> Self {
        Self { tokenizer }
    }

    /// Best-effort projection of `pred_text` onto `orig_text`.
    /// Never fails: any miss returns `orig_text` unchanged.
    pub fn realign(&self, pred_text: &str, orig_text: &str) -> String {
        match self.project(pred_text, orig_text) {
            Some(text) => text,
            None       => orig_text.to_string(),
        }
    }

    fn project(&self, pred_text: &str, orig_text: &str) -> Option<String> {
        if pred_text.is_empty() {
            return None;
        }

        let tok_text = match self.tokenizer.tokenize(orig_text) {
            Ok(tokens) => detokenize(&tokens),
            Err(e) => {
                tracing::warn!("Re-tokenizing '{}' failed: {e}", orig_text);
                return None;
            }
        };

        let Some(byte_start) = tok_text.find(pred_text) else {
            tracing::debug!("'{}' not in '{}'", pred_text, tok_text);
            return None;
        };
        let start_position = tok_text[..byte_start].chars().count();
        let end_position   = start_position + pred_text.chars().count() - 1;

        let orig_chars: Vec<char> = orig_text.chars().collect();
        let tok_chars:  Vec<char> = tok_text.chars().collect();
        let (orig_ns_text, orig_ns_to_s_map) = strip_spaces(&orig_chars);
        let (tok_ns_text, tok_ns_to_s_map)   = strip_spaces(&tok_chars);

        if orig_ns_text.len() != tok_ns_text.len() {
            tracing::debug!(
                "Length not equal after stripping spaces: '{}' vs '{}'",
                orig_text,
                tok_text
            );
            return None;
        }

        // comparison offset → stripped offset → original offset
        let mut tok_s_to_ns_map = vec![None; tok_chars.len()];
        for (ns_index, &s_index) in tok_ns_to_s_map.iter().enumerate() {
            tok_s_to_ns_map[s_index] = Some(ns_index);
        }
        let project = |s_index: usize| -> Option<usize> {
            let ns_index = tok_s_to_ns_map.get(s_index).copied().flatten()?;
            orig_ns_to_s_map.get(ns_index).copied()
        };

        let Some(orig_start_position) = project(start_position) else {
            tracing::debug!("Couldn't map start position");
            return None;
        };
        let Some(orig_end_position) = project(end_position) else {
            tracing::debug!("Couldn't map end position");
            return None;
        };
        if orig_end_position < orig_start_position {
            return None;
        }

        Some(orig_chars[orig_start_position..=orig_end_position].iter().collect())
    }
}
