//! Blog Service — standalone binary serving a small blog backed by a JSON file.
//!
//! Hosts the HTML pages and an RPC API on the same port.
//! Default: http://0.0.0.0:5000/

mod config;
mod error;
mod pages;
mod posts;
mod routes;
mod store;

use axum::Router;
use axum::routing::{get, post};
use config::Config;
use routes::AppState;
use std::sync::Arc;
use store::{ItemStore, JsonStore};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    log::info!("Opening blog posts at: {}", config.db_file);
    let opened = if config.create_if_missing {
        JsonStore::create_empty(&config.db_file)
    } else {
        JsonStore::open(&config.db_file)
    };
    let store = match opened {
        Ok(store) => store,
        Err(e) => {
            log::error!("Cannot open blog posts: {}", e);
            std::process::exit(1);
        }
    };
    // Fail at startup rather than on the first request.
    match store.load_all() {
        Ok(records) => log::info!("Loaded {} posts", records.len()),
        Err(e) => {
            log::error!("Cannot read blog posts: {}", e);
            std::process::exit(1);
        }
    }

    let state = Arc::new(AppState::new(Arc::new(store)));
    let app = router(state);

    let addr = config.listen_addr();
    log::info!("Blog Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}

fn router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        // HTML pages
        .route("/", get(pages::index))
        .route("/add", get(pages::add_form).post(pages::add_submit))
        .route(
            "/update/:post_id",
            get(pages::update_form).post(pages::update_submit),
        )
        .route("/delete/:post_id", post(pages::delete))
        .route("/like/:post_id", post(pages::like))
        // Posts RPC
        .route("/rpc/posts/list", get(routes::posts_list))
        .route("/rpc/posts/get", post(routes::posts_get))
        .route("/rpc/posts/create", post(routes::posts_create))
        .route("/rpc/posts/update", post(routes::posts_update))
        .route("/rpc/posts/delete", post(routes::posts_delete))
        .route("/rpc/posts/like", post(routes::posts_like))
        // Service
        .route("/rpc/stats", get(routes::stats))
        .route("/rpc/status", get(routes::status))
        .route("/rpc/backup/export", post(routes::backup_export))
        .route("/rpc/backup/restore", post(routes::backup_restore))
        .with_state(state)
        .layer(cors)
}
