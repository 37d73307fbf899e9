//! DistilBERT sequence classifier.
//!
//! A compact BERT-style encoder with a two-layer classification head over the
//! first token. Used as the model back-end of the sentiment engine; the default
//! hub checkpoint is the SST-2 fine-tune, and any local fine-tuned DistilBERT
//! directory with the same layout loads the same way.
//!
//! ```rust,no_run
//! use hybrid_sentiment::loaders::ModelSource;
//! use hybrid_sentiment::models::DistilBertClassifier;
//! use hybrid_sentiment::pipelines::sentiment::TextClassifier;
//!
//! # fn run() -> anyhow::Result<()> {
//! let source = ModelSource::Hub("distilbert-base-uncased-finetuned-sst-2-english".into());
//! let classifier = DistilBertClassifier::load(&source, candle_core::Device::Cpu)?;
//! for class in classifier.classify("What a great film")? {
//!     println!("{}: {:.4}", class.label, class.score);
//! }
//! # Ok(())
//! # }
//! ```

use crate::loaders::{ModelSource, TokenizerFile};
use crate::pipelines::sentiment::{ClassScore, TextClassifier};
use anyhow::{Context, Error as E, Result as AnyhowResult};
use candle_core::{DType, Device, IndexOp, Result, Tensor, D};
use candle_nn::{
    embedding, layer_norm, linear, ops::softmax, Embedding, LayerNorm, Linear, Module, VarBuilder,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{Tokenizer, TruncationParams};

const MIN_VALUE_F64: f64 = f32::MIN as f64;
const LAYER_NORM_EPS: f64 = 1e-12;
const MODEL_TYPE: &str = "distilbert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Gelu,
    Relu,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub hidden_dim: usize,
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

impl Config {
    /// Class labels ordered by class index.
    pub fn ordered_labels(&self) -> AnyhowResult<Vec<String>> {
        let mut indexed = self
            .id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|idx| (idx, label.clone()))
                    .map_err(|_| E::msg(format!("Invalid class id '{id}' in id2label")))
            })
            .collect::<AnyhowResult<Vec<_>>>()?;
        indexed.sort_by_key(|(idx, _)| *idx);

        anyhow::ensure!(!indexed.is_empty(), "id2label is empty; not a classification model");
        for (expected, (idx, _)) in indexed.iter().enumerate() {
            anyhow::ensure!(
                *idx == expected,
                "id2label is not contiguous: missing class id {expected}"
            );
        }

        Ok(indexed.into_iter().map(|(_, label)| label).collect())
    }
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(config.vocab_size, config.dim, vb.pp("word_embeddings"))?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.dim,
                vb.pp("position_embeddings"),
            )?,
            norm: layer_norm(config.dim, LAYER_NORM_EPS, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (_batch, seq_len) = input_ids.dims2()?;
        let positions = Tensor::arange(0u32, seq_len as u32, input_ids.device())?;

        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(&positions)?;

        words.broadcast_add(&positions)?.apply(&self.norm)
    }
}

/// Multi-head self-attention with separate q/k/v projections.
#[derive(Debug, Clone)]
struct Attention {
    q_lin: Linear,
    k_lin: Linear,
    v_lin: Linear,
    out_lin: Linear,
    num_heads: usize,
    head_dim: usize,
}

impl Attention {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dim = config.dim;
        Ok(Self {
            q_lin: linear(dim, dim, vb.pp("q_lin"))?,
            k_lin: linear(dim, dim, vb.pp("k_lin"))?,
            v_lin: linear(dim, dim, vb.pp("v_lin"))?,
            out_lin: linear(dim, dim, vb.pp("out_lin"))?,
            num_heads: config.n_heads,
            head_dim: dim / config.n_heads,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, dim) = hidden_states.dims3()?;

        let split_heads = |xs: Tensor| -> Result<Tensor> {
            xs.reshape((batch, seq_len, self.num_heads, self.head_dim))?
                .transpose(1, 2)?
                .contiguous()
        };

        let q = split_heads(hidden_states.apply(&self.q_lin)?)?;
        let k = split_heads(hidden_states.apply(&self.k_lin)?)?;
        let v = split_heads(hidden_states.apply(&self.v_lin)?)?;

        let q = (q / (self.head_dim as f64).sqrt())?;

        let attention_scores = q.matmul(&k.transpose(D::Minus2, D::Minus1)?)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax(&attention_scores, D::Minus1)?;

        attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, dim))?
            .apply(&self.out_lin)
    }
}

#[derive(Debug, Clone)]
struct FeedForward {
    lin1: Linear,
    lin2: Linear,
    activation: Activation,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            lin1: linear(config.dim, config.hidden_dim, vb.pp("lin1"))?,
            lin2: linear(config.hidden_dim, config.dim, vb.pp("lin2"))?,
            activation: config.activation,
        })
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.apply(&self.lin1)?;
        let xs = match self.activation {
            Activation::Gelu => xs.gelu_erf()?,
            Activation::Relu => xs.relu()?,
        };
        xs.apply(&self.lin2)
    }
}

/// Post-norm transformer block.
#[derive(Debug, Clone)]
struct TransformerLayer {
    attention: Attention,
    sa_layer_norm: LayerNorm,
    ffn: FeedForward,
    output_layer_norm: LayerNorm,
}

impl TransformerLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            attention: Attention::load(vb.pp("attention"), config)?,
            sa_layer_norm: layer_norm(config.dim, LAYER_NORM_EPS, vb.pp("sa_layer_norm"))?,
            ffn: FeedForward::load(vb.pp("ffn"), config)?,
            output_layer_norm: layer_norm(
                config.dim,
                LAYER_NORM_EPS,
                vb.pp("output_layer_norm"),
            )?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attention_output = self.attention.forward(hidden_states, attention_mask)?;
        let hidden_states = (attention_output + hidden_states)?.apply(&self.sa_layer_norm)?;

        let ffn_output = self.ffn.forward(&hidden_states)?;
        (ffn_output + hidden_states)?.apply(&self.output_layer_norm)
    }
}

/// Bare DistilBERT encoder.
#[derive(Debug, Clone)]
pub struct DistilBertModel {
    embeddings: Embeddings,
    layers: Vec<TransformerLayer>,
}

impl DistilBertModel {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = Embeddings::load(vb.pp("embeddings"), config)?;
        let vb_layers = vb.pp("transformer").pp("layer");
        let layers = (0..config.n_layers)
            .map(|i| TransformerLayer::load(vb_layers.pp(i), config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { embeddings, layers })
    }

    /// `input_ids` and `attention_mask` are `[batch, seq_len]`; returns `[batch, seq_len, dim]`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mut hidden_states = self.embeddings.forward(input_ids)?;
        let mask = additive_attention_mask(attention_mask, hidden_states.dtype())?;

        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &mask)?;
        }

        Ok(hidden_states)
    }
}

/// Turns a `[batch, seq_len]` 1/0 mask into `[batch, 1, 1, seq_len]` additive form.
fn additive_attention_mask(mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let (batch, seq_len) = mask.dims2()?;
    mask.to_dtype(dtype)?
        .affine(-1.0, 1.0)?
        .affine(MIN_VALUE_F64, 0.0)?
        .reshape((batch, 1, 1, seq_len))
}

#[derive(Debug, Clone)]
pub struct DistilBertForSequenceClassification {
    distilbert: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
}

impl DistilBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        Ok(Self {
            distilbert: DistilBertModel::load(vb.pp("distilbert"), config)?,
            pre_classifier: linear(config.dim, config.dim, vb.pp("pre_classifier"))?,
            classifier: linear(config.dim, num_labels, vb.pp("classifier"))?,
        })
    }

    /// Returns logits of shape `[batch, num_labels]`.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.distilbert.forward(input_ids, attention_mask)?;
        hidden_states
            .i((.., 0))?
            .apply(&self.pre_classifier)?
            .relu()?
            .apply(&self.classifier)
    }
}

/// DistilBERT classifier bundled with its tokenizer and label map.
pub struct DistilBertClassifier {
    model: DistilBertForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
    source: String,
}

impl DistilBertClassifier {
    /// Fetches the artifact behind `source` and loads it onto `device`.
    pub fn load(source: &ModelSource, device: Device) -> AnyhowResult<Self> {
        let files = source.fetch()?;

        let config_content = std::fs::read_to_string(&files.config)
            .with_context(|| format!("Failed to read config file {:?}", files.config))?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| E::msg(format!("Failed to parse model config: {e}")))?;

        if let Some(model_type) = config.model_type.as_deref() {
            anyhow::ensure!(
                model_type == MODEL_TYPE,
                "Unsupported model architecture `{model_type}`; expected a {MODEL_TYPE} sequence classifier"
            );
        }
        anyhow::ensure!(
            config.n_heads > 0 && config.dim % config.n_heads == 0,
            "Invalid attention layout: dim {} is not divisible by n_heads {}",
            config.dim,
            config.n_heads
        );
        let labels = config.ordered_labels()?;

        let dtype = DType::F32;
        let weights = &files.weights;
        let vb = if weights.extension().is_some_and(|ext| ext == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights], dtype, &device)? }
        } else if weights.extension().is_some_and(|ext| ext == "bin") {
            VarBuilder::from_pth(weights, dtype, &device)?
        } else {
            anyhow::bail!("Unsupported weight file format: {:?}", weights);
        };

        let model = DistilBertForSequenceClassification::load(vb, &config, labels.len())?;
        let tokenizer = load_tokenizer(&files.tokenizer, config.max_position_embeddings)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            labels,
            source: source.to_string(),
        })
    }
}

impl TextClassifier for DistilBertClassifier {
    fn classify(&self, text: &str) -> AnyhowResult<Vec<ClassScore>> {
        // Tokenize
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| E::msg(format!("Tokenization error: {e}")))?;

        // Prepare tensors
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // Forward pass
        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probabilities = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        Ok(self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(label, score)| ClassScore {
                label: label.clone(),
                score,
            })
            .collect())
    }

    fn source(&self) -> &str {
        &self.source
    }
}

fn load_tokenizer(file: &TokenizerFile, max_length: usize) -> AnyhowResult<Tokenizer> {
    let mut tokenizer = match file {
        TokenizerFile::Json(path) => Tokenizer::from_file(path)
            .map_err(|e| E::msg(format!("Failed to load tokenizer: {e}")))?,
        TokenizerFile::Vocab { path, lowercase } => wordpiece_tokenizer(path, *lowercase)?,
    };

    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(E::msg)?;

    Ok(tokenizer)
}

/// Standard BERT pipeline (normalizer, pre-tokenizer, `[CLS] .. [SEP]`) around a WordPiece vocab.
fn wordpiece_tokenizer(vocab: &Path, lowercase: bool) -> AnyhowResult<Tokenizer> {
    let vocab_path = vocab
        .to_str()
        .with_context(|| format!("Vocabulary path {vocab:?} is not valid UTF-8"))?;
    let wordpiece = WordPiece::from_file(vocab_path)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| E::msg(format!("Failed to load vocabulary {vocab_path}: {e}")))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::new(true, true, None, lowercase)));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

    let cls = tokenizer
        .token_to_id("[CLS]")
        .context("Vocabulary has no [CLS] token")?;
    let sep = tokenizer
        .token_to_id("[SEP]")
        .context("Vocabulary has no [SEP] token")?;
    tokenizer.with_post_processor(Some(BertProcessing::new(
        ("[SEP]".to_string(), sep),
        ("[CLS]".to_string(), cls),
    )));

    Ok(tokenizer)
}
