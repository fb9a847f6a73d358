//! Reseñas de Yelp: descarga, clasificación de sentimiento y dashboard web.
//!
//! Etapas:
//!   1. `descarga`: dataset del Hub → `data/yelp_reviews.csv`.
//!   2. `clasificar`: sentimiento por reseña → `data/yelp_reviews_classified.csv`.
//!   3. Servidor del dashboard (binario por defecto).

pub mod acquisition;
pub mod api;
pub mod app_state;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod enrich;
pub mod filters;
pub mod models;
pub mod normalize;
pub mod sentiment;

/// Inicializa el logging con `RUST_LOG` (por defecto `info`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
