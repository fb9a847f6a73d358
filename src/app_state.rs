use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use crate::{
    chat::SessionStore, config::AppConfig, dataset::DatasetCache, sentiment::SharedClassifier,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub datasets: DatasetCache,
    pub classifier: SharedClassifier,
    pub sessions: SessionStore,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub fn new(config: AppConfig, shutdown_tx: Option<oneshot::Sender<()>>) -> Self {
        let classifier = SharedClassifier::new(&config);
        Self::with_classifier(config, classifier, shutdown_tx)
    }

    pub fn with_classifier(
        config: AppConfig,
        classifier: SharedClassifier,
        shutdown_tx: Option<oneshot::Sender<()>>,
    ) -> Self {
        let sessions =
            SessionStore::with_idle_timeout(chrono::Duration::minutes(config.session_idle_minutes));
        Self {
            config,
            datasets: DatasetCache::new(),
            classifier,
            sessions,
            shutdown_sender: Arc::new(Mutex::new(shutdown_tx)),
        }
    }
}

// Estado expuesto en /api/status.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub dataset_path: String,
    pub dataset_available: bool,
    pub sentiment_backend: String,
    pub model_loaded: bool,
    pub active_sessions: usize,
}
