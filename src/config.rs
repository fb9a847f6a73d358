//! Carga y gestión de configuración de la aplicación (datos, modelo y servidor).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Nombre del CSV generado por la descarga.
pub const RAW_REVIEWS_FILE: &str = "yelp_reviews.csv";
/// Nombre del CSV enriquecido con el sentimiento de cada reseña.
pub const CLASSIFIED_REVIEWS_FILE: &str = "yelp_reviews_classified.csv";

const DEFAULT_SESSION_IDLE_MINUTES: i64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Motor que respalda al clasificador de sentimiento.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentimentBackendKind {
    /// DistilBERT SST-2 preentrenado, ejecutado en local con `candle`.
    DistilBert,
    /// Modelo de chat remoto a través de `rig`.
    Llm,
}

impl SentimentBackendKind {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "distilbert" | "bert" => Ok(Self::DistilBert),
            "llm" => Ok(Self::Llm),
            other => Err(anyhow!("Motor de sentimiento no soportado: {other}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DistilBert => "distilbert",
            Self::Llm => "llm",
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub data_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub open_browser: bool,

    pub dataset_id: String,
    pub enrich_limit: Option<usize>,

    pub sentiment_backend: SentimentBackendKind,
    pub llm_provider: LlmProvider,
    pub llm_chat_model: String,

    /// Minutos sin actividad tras los que se descarta una sesión de chat.
    pub session_idle_minutes: i64,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3322".to_string());
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let frontend_dir =
            PathBuf::from(env::var("FRONTEND_DIR").unwrap_or_else(|_| "frontend".to_string()));
        let open_browser = match env::var("OPEN_BROWSER") {
            Ok(value) => parse_bool(&value)?,
            Err(_) => true,
        };

        let dataset_id =
            env::var("DATASET_ID").unwrap_or_else(|_| "Yelp/yelp_review_full".to_string());
        let enrich_limit = match env::var("ENRICH_LIMIT") {
            Ok(value) => Some(
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| anyhow!("ENRICH_LIMIT debe ser un entero positivo: {value}"))?,
            ),
            Err(_) => None,
        };

        let backend_str =
            env::var("SENTIMENT_BACKEND").unwrap_or_else(|_| "distilbert".to_string());
        let sentiment_backend = SentimentBackendKind::from_str(&backend_str)?;

        let llm_provider_str =
            env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let llm_provider = LlmProvider::from_str(&llm_provider_str)?;
        let llm_chat_model =
            env::var("LLM_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let session_idle_minutes = match env::var("SESSION_IDLE_MINUTES") {
            Ok(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| anyhow!("SESSION_IDLE_MINUTES debe ser un entero positivo: {value}"))?,
            Err(_) => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Self {
            server_addr,
            data_dir,
            frontend_dir,
            open_browser,
            dataset_id,
            enrich_limit,
            sentiment_backend,
            llm_provider,
            llm_chat_model,
            session_idle_minutes,
        })
    }

    /// Configuración local apuntando a `data_dir`, sin abrir el navegador.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            data_dir: data_dir.into(),
            frontend_dir: PathBuf::from("frontend"),
            open_browser: false,
            dataset_id: "Yelp/yelp_review_full".to_string(),
            enrich_limit: None,
            sentiment_backend: SentimentBackendKind::DistilBert,
            llm_provider: LlmProvider::OpenAI,
            llm_chat_model: "gpt-4o-mini".to_string(),
            session_idle_minutes: DEFAULT_SESSION_IDLE_MINUTES,
        }
    }

    pub fn raw_reviews_path(&self) -> PathBuf {
        self.data_dir.join(RAW_REVIEWS_FILE)
    }

    pub fn classified_reviews_path(&self) -> PathBuf {
        self.data_dir.join(CLASSIFIED_REVIEWS_FILE)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(anyhow!("Valor booleano no válido: {other}")),
    }
}
