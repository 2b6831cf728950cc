// src/main.rs
use actix_web::{
    middleware::{Compress, DefaultHeaders, Logger},
    web, App, HttpServer,
};
use actix_web::http::header;
use actix_cors::Cors;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod category;
mod config;
mod dataset;
mod dos;
mod dos_handlers;
mod error;
mod export;
mod filters;
mod handlers;
mod import;
mod models;
mod monitoring;
mod sales_analytics;
mod sales_handlers;
mod stock_analytics;
mod stock_handlers;
mod time;
mod watcher;

use config::{load_config, Config};
use dataset::{DataSource, DatasetStore};
use error::ApiError;
use monitoring::{Metrics, RequestLogger};
use watcher::DataWatcher;

pub struct AppState {
    pub store: DatasetStore,
    pub config: Config,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(store: DatasetStore, config: Config) -> Self {
        Self {
            store,
            config,
            metrics: Arc::new(Metrics::new()),
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    if config.is_production() {
        validate_production_config(&config)?;
    }

    // Без данных сервер не стартует
    let source = DataSource::from_config(&config.data)
        .context("No data source configured")?;
    let dataset = source
        .load()
        .with_context(|| format!("Failed to load data from {}", source.describe()))?;
    let store = DatasetStore::new(source, dataset);

    let app_state = Arc::new(AppState::new(store, config.clone()));

    let _watcher = if config.hot_reload.enabled {
        match DataWatcher::start(&config, app_state.store.clone(), app_state.metrics.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("Hot reload disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&server_config.security.allowed_origins, server_config.is_production());
        let security_headers = setup_security_headers(&server_config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(RequestLogger::new(app_state.metrics.clone()))
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::PayloadConfig::new(server_config.security.max_request_size))
            .configure(configure_routes)
            .default_service(web::route().to(handlers::not_found))
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    );

    monitoring::configure_health_routes(cfg);

    cfg.service(
        web::scope("/api/v1")
            .route("/filters", web::get().to(handlers::get_filter_options))
            // Inventory
            .service(
                web::scope("/stock")
                    .route("/overview", web::get().to(stock_handlers::get_stock_overview))
            )
            // Sales
            .service(
                web::scope("/sales")
                    .route("/summary", web::get().to(sales_handlers::get_sales_summary))
                    .route("/trend", web::get().to(sales_handlers::get_sales_trend))
                    .route("/channels", web::get().to(sales_handlers::get_sales_channels))
                    .route("/products", web::get().to(sales_handlers::get_sales_products))
            )
            // Days of stock
            .service(
                web::scope("/dos")
                    .route("", web::get().to(dos_handlers::get_dos))
                    .route("/summary", web::get().to(dos_handlers::get_dos_summary))
                    .route("/export", web::get().to(dos_handlers::export_dos))
            )
            .service(
                web::scope("/admin")
                    .route("/reload", web::post().to(handlers::reload_data))
            ),
    );
}

// ==================== HELPER FUNCTIONS ====================

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

fn validate_production_config(config: &Config) -> anyhow::Result<()> {
    if config.security.allowed_origins.iter().any(|o| o == "*") {
        anyhow::bail!("Wildcard CORS origins not allowed in production!");
    }
    Ok(())
}

fn setup_cors(allowed_origins: &[String], is_production: bool) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
            header::REFERER,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::CONTENT_DISPOSITION])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") && !is_production {
        log::warn!("⚠️  Using wildcard CORS (*) in development mode");
        return cors.allow_any_origin().allow_any_header().allow_any_method();
    }

    for origin in allowed_origins.iter().filter(|o| !o.is_empty() && o.as_str() != "*") {
        cors = cors.allowed_origin(origin);
    }
    cors
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains; preload"
        ));
    }

    headers
}
