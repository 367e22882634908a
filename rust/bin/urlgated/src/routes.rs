//! Route registration: system endpoints, the admin API and the gated site.

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use urlgate_core::{Module, ServiceError};
use urls::{Resolution, UrlsModule};

/// Build the complete router.
///
/// System endpoints sit outside the gate. Everything else, the admin API
/// under `admin_mount` included, runs behind it; the admin prefix is one
/// of the gate's exclusions.
pub fn build_router(module: &UrlsModule, admin_mount: &str) -> Router {
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    let site = Router::new()
        .nest(admin_mount, module.routes())
        .fallback(page);

    system_routes.merge(module.protect(site))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "urlgated",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serves any path that has a stored node of its own and passed the gate.
async fn page(req: Request) -> Response {
    let exact = req
        .extensions()
        .get::<Resolution>()
        .and_then(|r| r.exact.as_ref());
    match exact {
        Some(node) => Json(serde_json::json!({
            "path": node.path,
            "site": node.site,
            "depth": node.depth,
        }))
        .into_response(),
        None => ServiceError::generic_not_found().into_response(),
    }
}
