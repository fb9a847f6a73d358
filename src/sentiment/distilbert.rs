//! DistilBERT SST-2 sobre `candle`, el clasificador preentrenado por defecto.
//!
//! Pesos y tokenizador se descargan del Hub en la primera carga y quedan en la
//! caché local de `hf-hub`. La inferencia corre en el pool de bloqueo.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{linear, ops::softmax, Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config, DistilBertModel};
use hf_hub::{api::tokio::Api, Repo, RepoType};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::{Polarity, Prediction, SentimentBackend};

pub const MODEL_REPO: &str = "distilbert/distilbert-base-uncased-finetuned-sst-2-english";
// El repo afinado no siempre publica tokenizer.json; el vocabulario es el del modelo base.
const TOKENIZER_FALLBACK_REPO: &str = "distilbert/distilbert-base-uncased";
const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct ClassifierConfigJson {
    dim: usize,
    #[serde(default)]
    id2label: HashMap<String, String>,
}

struct ModelFiles {
    config: PathBuf,
    weights: PathBuf,
    tokenizer: PathBuf,
}

async fn download_files(repo_id: &str) -> Result<ModelFiles> {
    let api = Api::new()?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

    let config = repo
        .get("config.json")
        .await
        .with_context(|| format!("Error descargando config.json de {repo_id}"))?;
    let weights = repo
        .get("model.safetensors")
        .await
        .with_context(|| format!("Error descargando model.safetensors de {repo_id}"))?;
    let tokenizer = match repo.get("tokenizer.json").await {
        Ok(path) => path,
        Err(_) => api
            .model(TOKENIZER_FALLBACK_REPO.to_string())
            .get("tokenizer.json")
            .await
            .with_context(|| format!("Error descargando tokenizer.json de {TOKENIZER_FALLBACK_REPO}"))?,
    };

    Ok(ModelFiles {
        config,
        weights,
        tokenizer,
    })
}

/// Codificador DistilBERT + cabeza de clasificación (`pre_classifier` → ReLU → `classifier`).
struct DistilBertClassifier {
    encoder: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: HashMap<String, String>,
    device: Device,
}

impl DistilBertClassifier {
    fn load(files: ModelFiles, device: Device) -> Result<Self> {
        let config_str = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_str)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)?;
        if class_cfg.id2label.is_empty() {
            return Err(anyhow!("config.json no define id2label"));
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, &device)?
        };
        let encoder = DistilBertModel::load(vb.pp("distilbert"), &config)?;
        let pre_classifier = linear(class_cfg.dim, class_cfg.dim, vb.pp("pre_classifier"))?;
        let classifier = linear(class_cfg.dim, class_cfg.id2label.len(), vb.pp("classifier"))?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Error cargando el tokenizador: {e}"))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Error configurando el tokenizador: {e}"))?;

        Ok(Self {
            encoder,
            pre_classifier,
            classifier,
            tokenizer,
            id2label: class_cfg.id2label,
            device,
        })
    }

    fn predict(&self, text: &str) -> Result<Prediction> {
        let tokens = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Error de tokenización: {e}"))?;
        let ids = tokens.get_ids();

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        // 1 = posición oculta. Una sola secuencia sin padding: no se oculta nada.
        let mask = Tensor::zeros((ids.len(), ids.len()), DType::U8, &self.device)?;

        let hidden = self.encoder.forward(&input_ids, &mask)?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&cls)?.relu()?;
        let logits = self.classifier.forward(&pooled)?;

        let probs = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;
        prediction_from_probs(&probs, &self.id2label)
    }
}

/// Etiqueta de mayor probabilidad y su probabilidad como confianza.
fn prediction_from_probs(probs: &[f32], id2label: &HashMap<String, String>) -> Result<Prediction> {
    let (best, score) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| anyhow!("El modelo no devolvió probabilidades"))?;

    let name = id2label
        .get(&best.to_string())
        .ok_or_else(|| anyhow!("La clase {best} no está en id2label"))?;
    let label =
        Polarity::parse(name).ok_or_else(|| anyhow!("Etiqueta de sentimiento desconocida: {name}"))?;
    Ok(Prediction::new(label, f64::from(score)))
}

/// Handle compartible del modelo cargado.
pub struct DistilBertSentiment {
    inner: Arc<DistilBertClassifier>,
}

impl DistilBertSentiment {
    pub async fn load() -> Result<Self> {
        info!("Cargando {MODEL_REPO}...");
        let files = download_files(MODEL_REPO).await?;
        let inner =
            tokio::task::spawn_blocking(move || DistilBertClassifier::load(files, Device::Cpu))
                .await??;
        info!("Modelo DistilBERT SST-2 cargado.");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

#[async_trait]
impl SentimentBackend for DistilBertSentiment {
    fn name(&self) -> &'static str {
        "distilbert"
    }

    async fn predict(&self, text: &str) -> Result<Prediction> {
        let inner = self.inner.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || inner.predict(&text)).await?
    }
}
