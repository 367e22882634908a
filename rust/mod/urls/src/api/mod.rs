mod aspects;
mod guard;
mod urls;

use std::sync::Arc;

use axum::Router;

use crate::middleware::UrlGate;

pub use urls::UrlView;

/// Shared application state.
pub type AppState = Arc<UrlGate>;

/// Build the admin API router.
///
/// All routes are relative; the caller nests them under the admin prefix,
/// which the gate itself never resolves.
pub fn build_router(gate: Arc<UrlGate>) -> Router {
    Router::new()
        .merge(urls::routes())
        .merge(aspects::routes())
        .layer(axum::middleware::from_fn_with_state(
            gate.clone(),
            guard::staff_only,
        ))
        .with_state(gate)
}
