//! Clasificación de sentimiento binaria (positivo/negativo) sobre un modelo
//! preentrenado intercambiable.
//!
//! API pública:
//!   - `SentimentClassifier::classify(&str, bool)`: una predicción por texto.
//!   - `SharedClassifier`: handle perezoso que carga el modelo una sola vez por
//!     proceso y lo comparte entre peticiones.

pub mod distilbert;
pub mod llm;

#[cfg(test)]
pub(crate) mod lexicon;

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, SentimentBackendKind},
    models::Sentimiento,
    normalize,
};

/// Longitud máxima (en caracteres) aceptada por el clasificador.
pub const MAX_CHARACTERS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }

    pub fn sentimiento(&self) -> Sentimiento {
        match self {
            Polarity::Positive => Sentimiento::Positivo,
            Polarity::Negative => Sentimiento::Negativo,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "positivo" => Some(Polarity::Positive),
            "negative" | "neg" | "negativo" => Some(Polarity::Negative),
            _ => None,
        }
    }
}

/// Etiqueta y confianza devueltas por el modelo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Polarity,
    pub score: f64,
}

impl Prediction {
    /// La confianza siempre queda dentro de [0, 1].
    pub fn new(label: Polarity, score: f64) -> Self {
        let score = if score.is_nan() { 0.5 } else { score.clamp(0.0, 1.0) };
        Self { label, score }
    }
}

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("The length of the string is too long, max characters is {max}")]
    TextTooLong { len: usize, max: usize },
    #[error("Error del modelo de sentimiento: {0}")]
    Model(#[from] anyhow::Error),
}

/// Rechaza textos de más de [`MAX_CHARACTERS`] caracteres.
pub fn check_length(text: &str) -> Result<(), SentimentError> {
    let len = text.chars().count();
    if len > MAX_CHARACTERS {
        return Err(SentimentError::TextTooLong {
            len,
            max: MAX_CHARACTERS,
        });
    }
    Ok(())
}

/// Motor concreto capaz de puntuar un texto.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn predict(&self, text: &str) -> anyhow::Result<Prediction>;
}

/// Clasificador listo para usar. Clonarlo comparte el mismo modelo.
#[derive(Clone)]
pub struct SentimentClassifier {
    backend: Arc<dyn SentimentBackend>,
}

impl SentimentClassifier {
    pub fn new(backend: Arc<dyn SentimentBackend>) -> Self {
        Self { backend }
    }

    /// Léxico de reseñas, sin red. Sólo para tests.
    #[cfg(test)]
    pub(crate) fn lexicon() -> Self {
        Self::new(Arc::new(lexicon::LexiconSentiment::new()))
    }

    /// Construye el motor indicado en la configuración.
    pub async fn load(cfg: &AppConfig) -> anyhow::Result<Self> {
        let classifier = match cfg.sentiment_backend {
            SentimentBackendKind::DistilBert => {
                Self::new(Arc::new(distilbert::DistilBertSentiment::load().await?))
            }
            SentimentBackendKind::Llm => Self::new(llm::from_config(cfg)?),
        };
        info!("Clasificador de sentimiento cargado (motor: {}).", classifier.backend_name());
        Ok(classifier)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Puntúa `text` con una única invocación del modelo.
    ///
    /// Con `clean` se calcula la versión normalizada del texto, pero la
    /// predicción se hace siempre sobre el texto original.
    pub async fn classify(&self, text: &str, clean: bool) -> Result<Prediction, SentimentError> {
        check_length(text)?;
        self.score(text, clean).await
    }

    /// Puntúa un texto cuya longitud ya se comprobó.
    async fn score(&self, text: &str, clean: bool) -> Result<Prediction, SentimentError> {
        if clean {
            let normalized = normalize::clean_text(text);
            debug!("Texto normalizado (no usado en la predicción): {normalized}");
        }

        let prediction = self.backend.predict(text).await?;
        Ok(Prediction::new(prediction.label, prediction.score))
    }
}

type Loader =
    Arc<dyn Fn(AppConfig) -> BoxFuture<'static, anyhow::Result<SentimentClassifier>> + Send + Sync>;

/// Handle compartido e inmutable: el modelo se carga en el primer uso y se
/// reutiliza durante toda la vida del proceso.
#[derive(Clone)]
pub struct SharedClassifier {
    config: AppConfig,
    loader: Loader,
    cell: Arc<OnceCell<SentimentClassifier>>,
}

impl SharedClassifier {
    /// Carga el motor de la configuración en el primer uso.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_loader(config, |cfg| {
            Box::pin(async move { SentimentClassifier::load(&cfg).await })
        })
    }

    pub fn with_loader<F>(config: &AppConfig, loader: F) -> Self
    where
        F: Fn(AppConfig) -> BoxFuture<'static, anyhow::Result<SentimentClassifier>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            config: config.clone(),
            loader: Arc::new(loader),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Handle ya inicializado con un clasificador concreto.
    pub fn preloaded(config: &AppConfig, classifier: SentimentClassifier) -> Self {
        Self {
            config: config.clone(),
            loader: Arc::new(
                |_: AppConfig| -> BoxFuture<'static, anyhow::Result<SentimentClassifier>> {
                    Box::pin(async { Err(anyhow!("Clasificador ya cargado")) })
                },
            ),
            cell: Arc::new(OnceCell::new_with(Some(classifier))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> anyhow::Result<&SentimentClassifier> {
        self.cell
            .get_or_try_init(|| (self.loader)(self.config.clone()))
            .await
            .map_err(|e| anyhow!("No se pudo cargar el modelo de sentimiento: {e}"))
    }

    /// La longitud se comprueba antes de cargar el modelo.
    pub async fn classify(&self, text: &str, clean: bool) -> Result<Prediction, SentimentError> {
        check_length(text)?;
        let classifier = self.get().await?;
        classifier.score(text, clean).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SentimentBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn predict(&self, text: &str) -> anyhow::Result<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            Ok(Prediction { label: Polarity::Negative, score: 1.7 })
        }
    }

    fn counting() -> Arc<CountingBackend> {
        Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            seen: std::sync::Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn great_food_is_positive() {
        let classifier = SentimentClassifier::lexicon();
        let prediction = classifier.classify("Great food and service!", false).await.unwrap();
        assert_eq!(prediction.label, Polarity::Positive);
        assert!(prediction.score > 0.5);
    }

    #[tokio::test]
    async fn texts_over_512_characters_are_rejected() {
        let classifier = SentimentClassifier::lexicon();
        let text = "a".repeat(600);
        let err = classifier.classify(&text, false).await.unwrap_err();
        assert!(matches!(err, SentimentError::TextTooLong { len: 600, max: 512 }));
        assert!(err.to_string().contains("max characters is 512"));
    }

    #[tokio::test]
    async fn limit_counts_characters_not_bytes() {
        let classifier = SentimentClassifier::lexicon();
        let text = "ñ".repeat(512);
        assert!(classifier.classify(&text, false).await.is_ok());
        let text = "ñ".repeat(513);
        assert!(classifier.classify(&text, false).await.is_err());
    }

    #[tokio::test]
    async fn clean_flag_still_scores_the_original_text() {
        let backend = counting();
        let classifier = SentimentClassifier::new(backend.clone());
        classifier.classify("The Food WAS bad!!", true).await.unwrap();
        assert_eq!(backend.seen.lock().unwrap().as_slice(), ["The Food WAS bad!!"]);
    }

    #[tokio::test]
    async fn scores_are_clamped_into_unit_interval() {
        let classifier = SentimentClassifier::new(counting());
        let prediction = classifier.classify("cualquier cosa", false).await.unwrap();
        assert_eq!(prediction.score, 1.0);
        assert_eq!(prediction.label, Polarity::Negative);
    }

    #[tokio::test]
    async fn rejected_text_never_reaches_the_model() {
        let backend = counting();
        let classifier = SentimentClassifier::new(backend.clone());
        let _ = classifier.classify(&"x".repeat(513), false).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    fn counting_loader(
        cfg: &AppConfig,
        backend: Arc<CountingBackend>,
        loads: Arc<AtomicUsize>,
    ) -> SharedClassifier {
        SharedClassifier::with_loader(cfg, move |_| {
            loads.fetch_add(1, Ordering::SeqCst);
            let backend = backend.clone();
            Box::pin(async move { Ok::<_, anyhow::Error>(SentimentClassifier::new(backend)) })
        })
    }

    #[tokio::test]
    async fn shared_classifier_loads_once() {
        let cfg = AppConfig::local("./data");
        let loads = Arc::new(AtomicUsize::new(0));
        let shared = counting_loader(&cfg, counting(), loads.clone());
        assert!(!shared.is_loaded());

        shared.classify("lovely", false).await.unwrap();
        let clone = shared.clone();
        clone.classify("lovely again", false).await.unwrap();

        assert!(shared.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let first = shared.get().await.unwrap() as *const SentimentClassifier;
        let second = clone.get().await.unwrap() as *const SentimentClassifier;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn shared_classifier_checks_length_before_loading() {
        let cfg = AppConfig::local("./data");
        let loads = Arc::new(AtomicUsize::new(0));
        let backend = counting();
        let shared = counting_loader(&cfg, backend.clone(), loads.clone());

        let err = shared.classify(&"x".repeat(513), true).await.unwrap_err();
        assert!(matches!(err, SentimentError::TextTooLong { len: 513, max: 512 }));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert!(!shared.is_loaded());

        shared.classify("ok", true).await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_surface_as_model_errors() {
        let cfg = AppConfig::local("./data");
        let shared = SharedClassifier::with_loader(&cfg, |_| {
            Box::pin(async { Err::<SentimentClassifier, _>(anyhow!("sin conexión con el Hub")) })
        });
        let err = shared.classify("hola", false).await.unwrap_err();
        assert!(matches!(err, SentimentError::Model(_)));
        assert!(err.to_string().contains("sin conexión"));
        assert!(!shared.is_loaded());
    }
}
