use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SpanModelConfig {
    pub vocab_size:      usize,
    pub max_seq_len:     usize,
    /// Segment vocabulary: 0 = question / text_a, 1 = document / text_b
    #[config(default = 2)]
    pub type_vocab_size: usize,
    pub d_model:         usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    #[config(default = 0.0)]
    pub dropout:         f64,
    /// Width of the sequence-classification head
    #[config(default = 7)]
    pub num_labels:      usize,
}

impl SpanModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpanModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let segment_embedding  = EmbeddingConfig::new(self.type_vocab_size, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let span_head  = LinearConfig::new(self.d_model, 2).init(device);
        let cls_head   = LinearConfig::new(self.d_model, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        SpanModel {
            token_embedding, position_embedding, segment_embedding, layers,
            final_norm, span_head, cls_head, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true on padding positions, which no token may attend to.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct SpanModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub segment_embedding:  Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub span_head:          Linear<B>,
    pub cls_head:           Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

pub struct SpanLogits<B: Backend> {
    pub start_logits: Tensor<B, 2>,
    pub end_logits:   Tensor<B, 2>,
}

impl<B: Backend> SpanModel<B> {
    /// All inputs [batch, seq_len] → hidden states [batch, seq_len, d_model]
    fn encode(
        &self,
        input_ids:   Tensor<B, 2, Int>,
        input_mask:  Tensor<B, 2, Int>,
        segment_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);
        let seg_emb = self.segment_embedding.forward(segment_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let pad_mask = input_mask.equal_elem(0);

        let mut x = self.dropout.forward(tok_emb + pos_emb + seg_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        self.final_norm.forward(x)
    }

    /// Start and end logits for every position: [batch, seq_len] each
    pub fn forward(
        &self,
        input_ids:   Tensor<B, 2, Int>,
        input_mask:  Tensor<B, 2, Int>,
        segment_ids: Tensor<B, 2, Int>,
    ) -> SpanLogits<B> {
        let [batch_size, seq_len] = input_ids.dims();
        let x = self.encode(input_ids, input_mask, segment_ids);

        // Project to 2 logits per token then split into start / end.
        let logits = self.span_head.forward(x); // [batch, seq_len, 2]
        let start_logits = logits.clone()
            .slice([0..batch_size, 0..seq_len, 0..1])
            .reshape([batch_size, seq_len]);
        let end_logits = logits
            .slice([0..batch_size, 0..seq_len, 1..2])
            .reshape([batch_size, seq_len]);

        SpanLogits { start_logits, end_logits }
    }

    /// Label probabilities from the [CLS] position: [batch, num_labels]
    pub fn classify(
        &self,
        input_ids:   Tensor<B, 2, Int>,
        input_mask:  Tensor<B, 2, Int>,
        segment_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, _] = input_ids.dims();
        let x = self.encode(input_ids, input_mask, segment_ids);
        let [_, _, d_model] = x.dims();

        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);
        softmax(self.cls_head.forward(cls), 1)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> SpanModelConfig {
        SpanModelConfig::new(32, 8, 16, 2, 1, 32).with_num_labels(3)
    }

    fn inputs(device: &<TestBackend as Backend>::Device) -> [Tensor<TestBackend, 2, Int>; 3] {
        let ids  = TensorData::new(vec![2i64, 5, 6, 3, 7, 3, 0, 0, 2, 8, 3, 9, 3, 0, 0, 0], [2, 8]);
        let mask = TensorData::new(vec![1i64, 1, 1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 0, 0, 0], [2, 8]);
        let segs = TensorData::new(vec![0i64, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0], [2, 8]);
        [
            Tensor::from_data(ids, device),
            Tensor::from_data(mask, device),
            Tensor::from_data(segs, device),
        ]
    }

    #[test]
    fn test_config_defaults() {
        let cfg = SpanModelConfig::new(100, 64, 32, 4, 2, 64);
        assert_eq!(cfg.type_vocab_size, 2);
        assert_eq!(cfg.num_labels, 7);
        assert_eq!(cfg.dropout, 0.0);
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model  = tiny().init::<TestBackend>(&device);
        let [ids, mask, segs] = inputs(&device);

        let out = model.forward(ids, mask, segs);
        assert_eq!(out.start_logits.dims(), [2, 8]);
        assert_eq!(out.end_logits.dims(), [2, 8]);
    }

    #[test]
    fn test_classify_rows_are_distributions() {
        let device = Default::default();
        let model  = tiny().init::<TestBackend>(&device);
        let [ids, mask, segs] = inputs(&device);

        let probs = model.classify(ids, mask, segs);
        assert_eq!(probs.dims(), [2, 3]);
        let sums: Vec<f32> = probs.sum_dim(1).into_data().convert::<f32>().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4);
        }
    }
}
