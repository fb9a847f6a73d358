//! Clasifica el sentimiento de cada reseña descargada y escribe el CSV que
//! consume el dashboard.

use anyhow::Context;
use tracing::info;

use yelp_sentiment_dashboard::{
    config::AppConfig, enrich, init_tracing, sentiment::SharedClassifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    let input = cfg.raw_reviews_path();
    let output = cfg.classified_reviews_path();

    let classifier = SharedClassifier::new(&cfg);
    let summary = enrich::enrich_file(&input, &output, &classifier, cfg.enrich_limit)
        .await
        .with_context(|| format!("Error clasificando {}", input.display()))?;

    info!("✅ {summary} Fichero: {}", output.display());
    Ok(())
}
