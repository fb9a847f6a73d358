//! Descarga el dataset de reseñas de Yelp y lo guarda como CSV (`review, stars`).

use anyhow::Context;
use tracing::info;

use yelp_sentiment_dashboard::{acquisition, config::AppConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    let output = cfg.raw_reviews_path();

    info!("Descargando {} en {}...", cfg.dataset_id, output.display());
    let summary = acquisition::download_reviews(&cfg.dataset_id, &output).await?;
    info!("✅ {summary}");
    Ok(())
}
