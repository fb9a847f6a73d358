//! Clasificación de sentimiento delegada en un LLM a través de Rig.
//! De momento se implementa OpenAI; Gemini/Ollama quedan preparados para el futuro.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::{
    agent::Agent,
    completion::{CompletionModel, Prompt},
};
use serde::Deserialize;
use tracing::warn;

use super::{Polarity, Prediction, SentimentBackend};
use crate::config::{AppConfig, LlmProvider};

const SENTIMENT_PROMPT: &str = r#"
Eres un clasificador de sentimiento binario para reseñas de restaurantes y comercios.
Para el texto del usuario decide si el sentimiento es "positive" o "negative" y estima
tu confianza entre 0 y 1.

La salida DEBE ser un único objeto JSON válido con dos claves:
- "label": "positive" o "negative".
- "score": número entre 0 y 1.

No incluyas explicaciones, solo el JSON.
"#;

#[derive(Debug, Deserialize)]
struct LlmVerdict {
    label: String,
    score: f64,
}

/// Motor de sentimiento respaldado por un agente de chat construido una sola vez.
pub struct LlmSentiment<M: CompletionModel> {
    agent: Agent<M>,
}

impl<M: CompletionModel> LlmSentiment<M> {
    pub fn new(agent: Agent<M>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl<M> SentimentBackend for LlmSentiment<M>
where
    M: CompletionModel + 'static,
{
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn predict(&self, text: &str) -> Result<Prediction> {
        let response = self.agent.prompt(text).await?;
        parse_verdict(&response)
    }
}

/// Construye el cliente y el agente del proveedor configurado.
pub fn from_config(cfg: &AppConfig) -> Result<Arc<dyn SentimentBackend>> {
    match cfg.llm_provider {
        LlmProvider::OpenAI => {
            use rig::providers::openai;
            // Trait para client.agent(...)
            use rig::client::CompletionClient as _;

            if std::env::var("OPENAI_API_KEY").is_err() {
                return Err(anyhow!("Falta la variable de entorno OPENAI_API_KEY"));
            }
            let client = openai::Client::from_env();
            let model_name = if cfg.llm_chat_model.is_empty() {
                "gpt-4o-mini"
            } else {
                cfg.llm_chat_model.as_str()
            };

            let agent = client
                .agent(model_name)
                .preamble(SENTIMENT_PROMPT)
                .build();
            Ok(Arc::new(LlmSentiment::new(agent)))
        }
        ref other => Err(anyhow!(
            "Proveedor LLM {:?} aún no implementado para sentimiento",
            other
        )),
    }
}

/// Interpreta la respuesta JSON del modelo (con o sin bloque ```json).
fn parse_verdict(response: &str) -> Result<Prediction> {
    let json_response = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let verdict: LlmVerdict = serde_json::from_str(json_response).map_err(|e| {
        warn!("Respuesta del LLM no interpretable: '{}'", response);
        anyhow!("No se pudo parsear la respuesta del LLM: {e}")
    })?;

    let label = Polarity::parse(&verdict.label)
        .ok_or_else(|| anyhow!("Etiqueta de sentimiento desconocida: {}", verdict.label))?;
    Ok(Prediction::new(label, verdict.score))
}
