mod predict;
mod routes;

use std::env;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use predict::config::ProxyConfig;
use predict::service::PredictService;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = ProxyConfig::from_env().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Configuration error: {}", e),
        )
    })?;

    match config.upstream_url {
        Some(ref url) => log::info!("Proxy mode: forwarding predictions to {}", url),
        None => log::warn!("EXTERNAL_PREDICT_URL is not set; serving mock predictions"),
    }

    let service = PredictService::new(config).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("HTTP client setup failed: {}", e),
        )
    })?;

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(service.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
