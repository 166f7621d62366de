//! JinaBERT embedding provider using the Candle ML framework.
//!
//! Loads `jinaai/jina-embeddings-v2-small-en` weights (safetensors) and its
//! HuggingFace tokenizer from local files, then embeds text with mean pooling
//! followed by L2 normalization.

use super::run_blocking;
use super::traits::EmbeddingProvider;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Activation, VarBuilder};
use candle_transformers::models::jina_bert::{BertModel, Config, PositionEmbeddingType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokenizers::tokenizer::{Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};
use tracing::info;

/// Architecture parameters for JinaBERT models.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JinaBertConfig {
    /// Model identifier, for logging
    pub model_id: String,
    /// Hidden dimension (embedding output dimension)
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    /// Feed-forward dimension
    pub intermediate_size: usize,
    /// Sequence length limit; longer texts are truncated.
    ///
    /// ALiBi bias memory grows as `heads * len^2 * 4` bytes, so this is kept
    /// well below the model's 8192 maximum.
    pub max_position_embeddings: usize,
}

impl Default for JinaBertConfig {
    fn default() -> Self {
        Self {
            model_id: "jinaai/jina-embeddings-v2-small-en".to_string(),
            hidden_size: 512,
            num_hidden_layers: 4,
            num_attention_heads: 8,
            intermediate_size: 2048,
            max_position_embeddings: 2048,
        }
    }
}

/// Loaded weights and tokenizer, shared with blocking inference tasks.
struct JinaModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// JinaBERT-backed [`EmbeddingProvider`].
///
/// Inference runs on tokio's blocking pool; the model is shared through an
/// `Arc` so each call can move a handle onto that thread.
pub struct JinaBertProvider {
    inner: Arc<JinaModel>,
    config: JinaBertConfig,
}

impl JinaBertProvider {
    /// Loads model weights and tokenizer from disk.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if either file is missing or invalid.
    pub fn from_files(
        model_path: &Path,
        tokenizer_path: &Path,
        config: JinaBertConfig,
    ) -> Result<Self, EmbeddingError> {
        let model_bytes = std::fs::read(model_path).map_err(|e| {
            EmbeddingError::ModelLoad(format!("Failed to read {}: {}", model_path.display(), e))
        })?;
        let tokenizer_bytes = std::fs::read(tokenizer_path).map_err(|e| {
            EmbeddingError::ModelLoad(format!(
                "Failed to read {}: {}",
                tokenizer_path.display(),
                e
            ))
        })?;
        Self::from_bytes(model_bytes, tokenizer_bytes, config)
    }

    /// Builds the provider from in-memory model and tokenizer bytes.
    pub fn from_bytes(
        model_bytes: Vec<u8>,
        tokenizer_bytes: Vec<u8>,
        config: JinaBertConfig,
    ) -> Result<Self, EmbeddingError> {
        info!(
            "Loading embedding model '{}' ({:.2}MB)",
            config.model_id,
            model_bytes.len() as f64 / 1_000_000.0
        );

        let mut tokenizer = Tokenizer::from_bytes(tokenizer_bytes).map_err(|e| {
            EmbeddingError::ModelLoad(format!("Failed to deserialize tokenizer: {}", e))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                stride: 0,
                strategy: TruncationStrategy::OnlyFirst,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| {
                EmbeddingError::InvalidConfig(format!("Failed to configure truncation: {}", e))
            })?;

        let device = select_device();
        let model_config = Config::new(
            tokenizer.get_vocab_size(true),
            config.hidden_size,
            config.num_hidden_layers,
            config.num_attention_heads,
            config.intermediate_size,
            Activation::Gelu,
            config.max_position_embeddings,
            2,     // type_vocab_size
            0.02,  // initializer_range
            1e-12, // layer_norm_eps
            0,     // pad_token_id
            PositionEmbeddingType::Alibi,
        );

        if model_bytes.len() < 8 {
            return Err(EmbeddingError::ModelLoad("Model file too small".to_string()));
        }

        // ALiBi bias in candle's jina_bert is hardcoded to F32
        let vb = VarBuilder::from_buffered_safetensors(model_bytes, DType::F32, &device)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Failed to create VarBuilder: {}", e)))?;
        let model = BertModel::new(vb, &model_config)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Failed to create BertModel: {}", e)))?;

        info!(
            "Model loaded: {}d hidden, {} layers, {} heads",
            config.hidden_size, config.num_hidden_layers, config.num_attention_heads
        );

        Ok(Self {
            inner: Arc::new(JinaModel {
                model,
                tokenizer,
                device,
            }),
            config,
        })
    }
}

impl JinaModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::TokenizationFailed(format!("Encoding failed: {}", e)))?;
        let ids = encoding.get_ids().to_vec();
        if ids.is_empty() {
            return Err(EmbeddingError::TokenizationFailed(
                "Tokenizer returned no tokens".to_string(),
            ));
        }

        let inference = |e: candle_core::Error| EmbeddingError::InferenceFailed(e.to_string());

        // [1, seq_len] -> [1, seq_len, hidden] -> mean pool -> [1, hidden]
        let input = Tensor::from_vec(ids.clone(), ids.len(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference)?;
        let hidden = self.model.forward(&input).map_err(inference)?;
        let (_, n_tokens, _) = hidden.dims3().map_err(inference)?;
        let pooled = hidden
            .sum(1)
            .and_then(|t| t.affine(1.0 / n_tokens as f64, 0.0))
            .map_err(inference)?;
        let norm = pooled
            .sqr()
            .and_then(|t| t.sum_keepdim(1))
            .and_then(|t| t.sqrt())
            .map_err(inference)?;
        pooled
            .broadcast_div(&norm)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(inference)
    }
}

#[async_trait]
impl EmbeddingProvider for JinaBertProvider {
    fn name(&self) -> &str {
        &self.config.model_id
    }

    fn dimension(&self) -> usize {
        self.config.hidden_size
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.inner);
        let text = text.to_string();
        run_blocking(move || model.embed(&text)).await
    }
}

/// Selects CUDA, then Metal, then CPU.
fn select_device() -> Device {
    if let Ok(device) = Device::new_cuda(0) {
        info!("Using CUDA GPU");
        return device;
    }
    if let Ok(device) = Device::new_metal(0) {
        info!("Using Metal GPU");
        return device;
    }
    info!("Using CPU");
    Device::Cpu
}
