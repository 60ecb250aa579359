use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Compress, web};
use dotenvy::dotenv;
use tracing::info;

use weblytics::api::{CaptureAnalytics, analytics_routes, health_routes, predict_routes};
use weblytics::config::AppConfig;
use weblytics::services::{AnalyticsService, ExternalApiProvider, GeoIpLookup};
use weblytics::storage::SeaOrmStorage;
use weblytics::system::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::process::exit(1);
    });

    // guard 在 main 结束前保持存活，否则日志线程提前退出
    let _log_guard = init_logging(&config.logging);

    let storage = SeaOrmStorage::new(&config.database.url, config.database.pool_size)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize storage: {e}");
            std::process::exit(1);
        });
    info!("Using storage backend: {}", storage.get_backend_name());

    let geoip: Option<Arc<dyn GeoIpLookup>> = if config.geoip.enabled {
        info!("GeoIP enrichment enabled");
        Some(Arc::new(ExternalApiProvider::new(
            config.geoip.api_url_template.clone(),
        )))
    } else {
        info!("GeoIP enrichment disabled");
        None
    };

    let storage = Arc::new(storage);
    let analytics = Arc::new(AnalyticsService::new(Arc::clone(&storage), geoip));
    let ml_config = config.ml.clone();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(CaptureAnalytics::new(Arc::clone(&analytics)))
            .app_data(web::Data::new(Arc::clone(&analytics)))
            .app_data(web::Data::new(ml_config.clone()))
            .configure(analytics_routes)
            .configure(health_routes)
            .configure(predict_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
