use axum::middleware::{from_fn, from_fn_with_state};
use axum::{Extension, Router};
use sqlx::PgPool;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod config;
mod db;
mod middleware;
mod utils;

use crate::api::auth::AuthDoc;
use crate::config::Config;
use crate::db::queries::author_request::AuthorRequestDoc;
use crate::db::queries::notification::NotificationDoc;
use crate::db::queries::review::ReviewDoc;
use crate::db::queries::user::UserDoc;
use crate::middleware::auth::{create_permission_cache, jwt_middleware, rbac_middleware};

#[tokio::main]
async fn main() {
    Config::init();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .init();

    let permission_cache = create_permission_cache();
    let pool = db::pool::get_db_pool().await;

    let merged_doc = AuthDoc::openapi()
        .merge_from(AuthorRequestDoc::openapi())
        .merge_from(ReviewDoc::openapi())
        .merge_from(UserDoc::openapi())
        .merge_from(NotificationDoc::openapi());

    // Public routes (no JWT required)
    let public_routes = Router::new().merge(api::auth::auth_routes());

    // Private routes
    let private_routes = Router::new()
        .merge(api::author_request::author_request_routes())
        .merge(api::user::user_routes())
        .merge(api::notification::notification_routes())
        .merge(api::auth::secure_auth_routes())
        .route_layer(from_fn_with_state(pool.clone(), rbac_middleware))
        .route_layer(from_fn(jwt_middleware));

    let app = Router::new()
        .merge(api::health::health_routes())
        .merge(public_routes)
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(permission_cache.clone()))
        .with_state(pool.clone());

    run_server(app, pool).await;
    println!("Shutdown complete.");
}

async fn shutdown_signal(pool: PgPool) {
    signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    println!("Received Ctrl+C, shutting down...");
    println!("🛠️ Closing database pool...");
    pool.close().await;
    println!("✅ Database pool closed. Server shutting down.");
}

async fn run_server(app: Router, pool: PgPool) {
    let addr: SocketAddr = Config::get()
        .bind_addr
        .parse()
        .expect("Invalid BIND_ADDR value");
    println!("Server running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await.expect("Failed to bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool))
        .await
        .expect("Server encountered an error");
}
