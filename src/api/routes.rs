use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::image_handler::ImageServiceState;
use crate::settings::ServerSettings;

/// 构建完整路由。CORS 对任意来源开放并允许携带凭据。
pub fn router(state: ImageServiceState, settings: &ServerSettings) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/procesar-imagen", post(handlers::process_image))
        .route(
            "/api/procesar-imagen-base64",
            post(handlers::process_image_base64),
        )
        .route("/api/info-imagen", post(handlers::image_info))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
