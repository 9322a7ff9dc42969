//! Backend of a spider species catalog: taxonomy records, where each species was
//! collected, and the photographs attached to each record.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server, every endpoint is a JSON `POST` apart from the health check
//! - Records and province reference data live in Redis as JSON documents
//! - Photographs are plain files in one directory, records only hold their names
//! - One background worker removes image files that records no longer reference
//! - A per-family genus/species tree grows with every registration
//!
//!
//!
//! # Geography Views
//!
//! Asking "where has this spider been found" never reads a precomputed index. The
//! matching records are fetched and folded into a province -> locality -> positions tree
//! on every request, see [`catalog::geography::aggregate`].
//!
//! - Provinces and localities keep the order they are first seen in
//! - A locality is keyed by province and name together, so equal names in two
//!   provinces stay apart
//! - Position names are deduplicated within a locality
//!
//!
//!
//! # Image Consistency
//!
//! The image list stored on a record is authoritative, files on disk follow it.
//!
//! - Upload writes files first and rolls them back if the record cannot be updated
//! - Removal updates the record first, then hands the files to the cleanup worker
//! - Every file gets up to `CLEANUP_ATTEMPTS` delete attempts, failures are only logged
//! - A failed cleanup never fails the request, worst case is an orphaned file
//!
//!
//!
//! # Configuration
//!
//! | variable | default |
//! |---|---|
//! | `RUST_PORT` | `8080` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379`, or the secret file `/run/secrets/REDIS_URL` |
//! | `SPIDER_IMAGE_PATH` | `./images` |
//! | `MAX_REQUEST_SIZE` | `10485760` |
//! | `CLEANUP_ATTEMPTS` | `3` |
//! | `CLEANUP_QUEUE_SIZE` | `256` |
//!
//! Logging follows `RUST_LOG`.
//!
//!
//!
//! # Setup
//!
//! Run locally.
//! ```sh
//! RUST_LOG=info cargo run -- --stage localhost
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod cleanup;
pub mod config;
pub mod database;
pub mod error;
pub mod geographies;
pub mod images;
pub mod payloads;
pub mod routes;
pub mod spiders;
pub mod state;
pub mod statistics;
pub mod storage;
pub mod utils;

use config::Config;
use routes::{
    delete_handler, districts_handler, edit_handler, families_handler, health_handler,
    images_handler, manager_spider_info_handler, provinces_handler, register_handler,
    remove_images_handler, spider_info_handler, spider_list_handler,
    spider_type_geographies_handler, spiders_by_geographies_handler,
    spiders_by_locality_handler, spiders_by_type_handler, statistics_handler,
    upload_images_handler,
};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/test-service", get(health_handler))
        .route("/geographies/provinces", post(provinces_handler))
        .route("/geographies/districts", post(districts_handler))
        .route(
            "/geographies/spider-type",
            post(spider_type_geographies_handler),
        )
        .route("/spiders/info", post(spider_info_handler))
        .route("/spiders/images", post(images_handler))
        .route("/spiders/geographies", post(spiders_by_geographies_handler))
        .route("/spiders/locality", post(spiders_by_locality_handler))
        .route("/spiders/type", post(spiders_by_type_handler))
        .route("/spiders/list", post(spider_list_handler))
        .route("/spiders/statistics", post(statistics_handler))
        .route("/spiders/families", post(families_handler))
        .route("/spiders/manage/info", post(manager_spider_info_handler))
        .route("/spiders/register", post(register_handler))
        .route("/spiders/edit", post(edit_handler))
        .route("/spiders/delete", post(delete_handler))
        .route("/spiders/images/upload", post(upload_images_handler))
        .route("/spiders/images/remove", post(remove_images_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_request_size))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(stage: &str) -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state for stage {stage}...");
    let state = AppState::new(Config::load()).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server stopped unexpectedly")?;

    info!("Waiting for queued image cleanup...");
    state.cleanup.flush().await;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
