use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod model;
mod routes;
mod seed;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::service::RecordService;
use crate::store::{EmployeeStore, MemoryEmployeeStore, MySqlEmployeeStore};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HR records backend is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    if config.uses_memory_store() {
        warn!("Using the in-memory store; records are lost on shutdown");
        serve(MemoryEmployeeStore::new(), config).await
    } else {
        let pool = init_db(&config.database_url, config.db_max_connections).await?;
        serve(MySqlEmployeeStore::new(pool), config).await
    }
}

async fn serve<S>(store: S, config: Config) -> anyhow::Result<()>
where
    S: EmployeeStore + Send + Sync + 'static,
{
    if config.seed_demo_data {
        seed::seed_if_empty(&store)
            .await
            .context("Failed to seed demo data")?;
    }

    let service = Data::new(RecordService::new(store));
    let limiter = routes::build_limiter(config.rate_api_per_min)?;
    let api_prefix = config.api_prefix.clone();
    let cors_origin = config.cors_allowed_origin.clone();
    let openapi = docs::api_doc(&api_prefix);

    info!(
        addr = %config.server_addr,
        prefix = %api_prefix,
        cors_origin = %cors_origin,
        "Listening"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(routes::cors(&cors_origin))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure::<S>(cfg, &api_prefix, &limiter))
    })
    .bind(&config.server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
