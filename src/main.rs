use anyhow::Context;
use axum::Router;
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};

use yelp_sentiment_dashboard::{api, app_state::AppState, config, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    init_tracing();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;

    let dataset_path = cfg.classified_reviews_path();
    if !dataset_path.is_file() {
        warn!(
            "No existe {}. Ejecuta `descarga` y después `clasificar` antes de usar el dashboard.",
            dataset_path.display()
        );
    }

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 3. Crear estado compartido de la aplicación (el modelo se carga en el primer uso)
    let app_state = AppState::new(cfg.clone(), Some(shutdown_tx));
    let datasets = app_state.datasets.clone();

    // Precarga en segundo plano para que la primera vista no espere al CSV.
    let warm_path = dataset_path;
    tokio::spawn(async move {
        if warm_path.is_file() {
            if let Err(e) = datasets.get_async(&warm_path).await {
                warn!("No se pudo precargar el dataset: {e:#}");
            }
        }
    });

    // 4. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state))
        .fallback_service(ServeDir::new(&cfg.frontend_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 5. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {}", cfg.server_addr))?;
    let server_url = format!("http://{}", listener.local_addr()?);
    info!("🚀 Dashboard escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if cfg.open_browser && webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
