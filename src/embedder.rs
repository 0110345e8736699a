use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::EmbedError;
use fastembed::{InitOptions, TextEmbedding};
use log::debug;
use std::path::Path;
use std::sync::Mutex;

/// Turns text into fixed-length vectors. Every vector returned by one
/// embedder has `dimensions()` components.
pub trait Embedder {
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::EmbeddingFailed("No embedding returned".to_string()))
    }
}

/// Build the embedder selected in the configuration.
pub fn from_config(
    config: &EmbeddingConfig,
    model_cache_dir: &Path,
) -> Result<Box<dyn Embedder>, EmbedError> {
    match config.backend {
        EmbeddingBackend::Fastembed => Ok(Box::new(FastEmbedder::new(
            &config.model,
            model_cache_dir,
        )?)),
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(config.dimensions))),
    }
}

/// Local ONNX sentence embeddings via fastembed.
pub struct FastEmbedder {
    // fastembed's embed() takes &mut self
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedder {
    pub fn new(model_name: &str, model_cache_dir: &Path) -> Result<Self, EmbedError> {
        let model_enum = parse_model_name(model_name)?;

        debug!("Initializing embedding model {}...", model_name);
        let options = InitOptions::new(model_enum)
            .with_cache_dir(model_cache_dir.to_path_buf())
            .with_show_download_progress(true);

        let mut model =
            TextEmbedding::try_new(options).map_err(|e| EmbedError::InitFailed(e.to_string()))?;

        let dimensions = model
            .embed(vec!["dimension check"], None)
            .map_err(|e| EmbedError::InitFailed(format!("Failed to measure dimensions: {}", e)))?
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbedError::InitFailed("Model returned no embedding".to_string()))?;

        debug!("Embedding model initialized ({} dimensions)", dimensions);
        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self.model.lock().map_err(|e| {
            EmbedError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbedError::EmbeddingFailed(e.to_string()))
    }
}

fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbedError> {
    use fastembed::EmbeddingModel::*;

    match name.to_lowercase().as_str() {
        "all-mpnet-base-v2" => Ok(AllMpnetBaseV2),
        "all-minilm-l6-v2" => Ok(AllMiniLML6V2),
        "all-minilm-l6-v2-q" => Ok(AllMiniLML6V2Q),
        "bge-small-en-v1.5" => Ok(BGESmallENV15),
        "bge-small-en-v1.5-q" => Ok(BGESmallENV15Q),
        "bge-base-en-v1.5" => Ok(BGEBaseENV15),
        "bge-base-en-v1.5-q" => Ok(BGEBaseENV15Q),
        "bge-large-en-v1.5" => Ok(BGELargeENV15),
        "bge-large-en-v1.5-q" => Ok(BGELargeENV15Q),
        _ => Err(EmbedError::InvalidModel(format!(
            "Unknown model: {}. Supported models: all-mpnet-base-v2, all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5 (add -q suffix for quantized)",
            name
        ))),
    }
}

/// Deterministic offline embedder: feature-hashed bag of words.
///
/// Component 0 is a constant bias so that text without any tokens still maps
/// to a unit vector. Remaining components count lowercase alphanumeric tokens
/// hashed with FNV-1a. The result is L2 normalized.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(2),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        vector[0] = 1.0;

        let buckets = (self.dimensions - 1) as u64;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = 1 + (fnv1a(&token.to_lowercase()) % buckets) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        vector.iter_mut().for_each(|x| *x /= norm);
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}
