use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use atlas_core::config::EmbedSettings;
pub use atlas_core::traits::Embedder;

pub mod device;
pub mod hash;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

/// Sentence embedder over a local BERT-family checkpoint
/// (e.g. `all-MiniLM-L6-v2`): masked mean pooling + L2 normalization.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl BertEmbedder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors`
    /// (or `pytorch_model.bin`) from `model_dir`.
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);

        let config_path = model_dir.join("config.json");
        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?,
        )?;
        let dim = raw
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let config: BertConfig = serde_json::from_value(raw)?;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DTYPE, &device)? }
        } else {
            let weights_path = model_dir.join("pytorch_model.bin");
            let weights = candle_core::pickle::read_all(&weights_path)
                .with_context(|| format!("reading {}", weights_path.display()))?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DTYPE, &device)
        };
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, pad_id })
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let out: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { self.embed(texts) }
}

/// Embedder selected by configuration.
///
/// `use_fake_embeddings` (or `APP_USE_FAKE_EMBEDDINGS=1`) picks the
/// [`HashEmbedder`]; otherwise the BERT model is loaded from the resolved
/// model directory.
pub fn get_default_embedder(settings: &EmbedSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = settings.use_fake_embeddings
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
    if use_fake {
        tracing::info!("using HashEmbedder");
        return Ok(Box::new(HashEmbedder::default()));
    }
    let dir = resolve_model_dir(settings)?;
    Ok(Box::new(BertEmbedder::new(&dir, settings.max_len)?))
}

/// Model directory lookup order: `embed.model_dir`, `APP_MODEL_DIR`,
/// `MODEL_DIR`, `models/<model>`, `../models/<model>`.
pub fn resolve_model_dir(settings: &EmbedSettings) -> Result<PathBuf> {
    let configured = settings
        .model_dir
        .iter()
        .map(atlas_core::config::expand_path)
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain(std::env::var("MODEL_DIR").ok().map(PathBuf::from));
    let local = [Path::new("models"), Path::new("../models")]
        .into_iter()
        .map(|root| root.join(&settings.model));

    for dir in configured.chain(local) {
        if dir.exists() {
            tracing::info!(dir = %dir.display(), "using model dir");
            return Ok(dir);
        }
    }
    Err(anyhow!("Could not locate model directory for '{}'", settings.model))
}
