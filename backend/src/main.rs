mod config;
mod models;
mod page;
mod routes;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use adoption_inference::ModelHandle;
use anyhow::Context;
use log::{info, warn};

use config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    let config = AppConfig::from_env();
    info!("🚀 Starting the adoption predictor");

    // Loaded lazily on the first submission.
    if !config.model_path.is_file() {
        warn!(
            "Model artifact {} not found, predictions will fail until it exists",
            config.model_path.display()
        );
    }
    let model = web::Data::new(ModelHandle::new(&config.model_path, config.threshold));

    let bind_address = config.bind_address();
    info!("🌐 Listening on http://{}", bind_address);
    info!("👷 Workers: {}", config.workers);
    info!("📦 Model: {}", config.model_path.display());
    info!("🔧 Endpoints:");
    info!("   GET  /                - Predictor form");
    info!("   POST /predict         - Form submission");
    info!("   POST /api/predict     - JSON prediction");
    info!("   GET  /api/model-info  - Model information");
    info!("   GET  /api/health      - Health check");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(model.clone())
            .configure(routes::configure)
    })
    .workers(config.workers)
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {bind_address}"))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}
