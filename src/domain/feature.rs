// ============================================================
// Layer 3 — Window and Feature Domain Types
// ============================================================
// A long document is cut into overlapping DocSpans; every
// (Example, DocSpan) pair becomes one Feature, the fixed-length
// model input plus the provenance needed to read the model's
// answer back:
//
//   tokens:   [CLS] who owns [SEP] steve smith ' s car [SEP] [PAD]..
//   segment:  0     0   0    0     1     1     1 1 1   1     0
//   orig map: -     -   -    -     0     1     2 3 4   -     -
//
// The provenance maps are sparse: only document positions carry
// a value, everything else is absent.
//
// Reference: Devlin et al. (2019) BERT, SQuAD fine-tuning
//            Rust Book §8 (Vectors), §6 (Option)

/// Half-open window `[start, start + length)` over the sub-tokenized document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocSpan {
    pub start:  usize,
    pub length: usize,
}

impl DocSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// One past the last covered sub-token
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end()
    }
}

/// Sparse mapping from encoded-sequence position to a value.
/// A position is either defined or absent; there is no default.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMap<T> {
    slots: Vec<Option<T>>,
}

impl<T> PositionMap<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn insert(&mut self, position: usize, value: T) {
        if position >= self.slots.len() {
            self.slots.resize_with(position + 1, || None);
        }
        self.slots[position] = Some(value);
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub fn contains(&self, position: usize) -> bool {
        self.get(position).is_some()
    }

    /// Number of defined positions
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Defined `(position, value)` pairs in ascending position order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }
}

impl<T> Default for PositionMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One encoded model input for an (Example, DocSpan) pair
#[derive(Debug, Clone)]
pub struct Feature {
    /// Globally unique within a run, used to match scorer output
    pub unique_id:      u64,
    pub example_index:  usize,
    pub doc_span_index: usize,

    /// Unpadded token sequence: [CLS] question [SEP] doc [SEP]
    pub tokens: Vec<String>,

    /// Sequence position → index into `Example::doc_tokens`
    pub token_to_orig_map: PositionMap<usize>,

    /// Sequence position → is this span the max-context span for the token
    pub token_is_max_context: PositionMap<bool>,

    // The three arrays below are exactly max_seq_length long.
    pub input_ids:   Vec<u32>,
    pub input_mask:  Vec<u32>,
    pub segment_ids: Vec<u32>,
}

impl Feature {
    /// Number of real (non-padding) positions
    pub fn real_len(&self) -> usize {
        self.input_mask.iter().filter(|&&m| m == 1).count()
    }

    pub fn is_max_context(&self, position: usize) -> bool {
        self.token_is_max_context.get(position).copied().unwrap_or(false)
    }
}

/// Encoded input for the single-sequence / sequence-pair classifier
#[derive(Debug, Clone)]
pub struct PairFeature {
    pub guid:        String,
    pub tokens:      Vec<String>,
    pub input_ids:   Vec<u32>,
    pub input_mask:  Vec<u32>,
    pub segment_ids: Vec<u32>,
}

/// Scorer output for one Feature: one start and one end logit per position
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub unique_id:    u64,
    pub start_logits: Vec<f32>,
    pub end_logits:   Vec<f32>,
}
