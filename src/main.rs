use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};

use tabletalk::config::Config;
use tabletalk::handlers::{ask_question, get_schema, upload_dataset};
use tabletalk::services::{AnalysisService, ChartRenderer, GeminiOracle, MemoryDatasetStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("🚀 Starting Table Talk API");

    // Load configuration from environment variables
    let config = Config::from_env();

    // Initialize services
    let store = MemoryDatasetStore::new();
    let oracle = GeminiOracle::new(&config).map_err(|e| {
        log::error!("❌ Failed to initialize oracle client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let renderer = ChartRenderer::new(config.chart_dir.clone());
    let analysis = AnalysisService::new(store.clone(), oracle, renderer);

    // Start HTTP server
    let server_url = format!("http://127.0.0.1:{}", config.server_port);
    log::info!("🌐 Starting server at {}", server_url);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(analysis.clone()))
            .service(
                web::resource("/upload")
                    .route(web::post().to(upload_dataset::<MemoryDatasetStore>)),
            )
            .service(
                web::resource("/ask")
                    .route(web::post().to(ask_question::<MemoryDatasetStore, GeminiOracle>)),
            )
            .service(
                web::resource("/datasets/{dataset_id}/schema")
                    .route(web::get().to(get_schema::<MemoryDatasetStore>)),
            )
            .service(
                web::resource("/debug/datasets").route(web::get().to(
                    |store: web::Data<MemoryDatasetStore>| async move {
                        let ids = store.ids();
                        HttpResponse::Ok().json(ids)
                    },
                )),
            )
    })
    .bind(format!("127.0.0.1:{}", config.server_port))
    .map_err(|e| {
        log::error!("❌ Failed to bind to port {}: {}", config.server_port, e);
        e
    })?
    .run()
    .await
}
