//! URL module: database-backed URL nodes with per-URL policies.
//!
//! # Resources
//!
//! - **URL**: a stored path on a site; ancestry is derived from the path
//! - **Visibility**: publishing window
//! - **Redirect**: permanent or temporary redirect target
//! - **Access**: login / staff / superuser requirement
//! - **Group / user restrictions**: allow lists
//!
//! The [`middleware::UrlGate`] resolves every request path against the
//! stored nodes, nearest first, and runs the mounted policy tests before
//! the application's own handlers see the request.
//!
//! # Usage
//!
//! ```ignore
//! let module = UrlsModule::new(sql, &settings, identity)?;
//! let app = Router::new()
//!     .nest("/admin", module.routes())
//!     .fallback(handler);
//! let app = module.protect(app);
//! ```

pub mod api;
pub mod config;
pub mod exclusions;
pub mod middleware;
pub mod model;
pub mod path;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod service;

use std::sync::Arc;

use axum::Router;

use urlgate_core::{IdentitySource, Module, ServiceError};
use urlgate_sql::SQLStore;

pub use config::GateSettings;
pub use middleware::{UrlGate, url_gate_middleware};
pub use resolver::Resolution;
pub use service::{UrlError, UrlService};

/// URL module implementing the Module trait.
pub struct UrlsModule {
    gate: Arc<UrlGate>,
}

impl UrlsModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        settings: &GateSettings,
        identity: Arc<dyn IdentitySource>,
    ) -> Result<Self, ServiceError> {
        let service = UrlService::new(sql, &settings.site)?;
        let gate = UrlGate::from_settings(service, settings, identity)?;
        Ok(Self {
            gate: Arc::new(gate),
        })
    }

    pub fn gate(&self) -> &Arc<UrlGate> {
        &self.gate
    }

    /// Run the gate in front of every route of `app`.
    pub fn protect(&self, app: Router) -> Router {
        app.layer(axum::middleware::from_fn_with_state(
            self.gate.clone(),
            url_gate_middleware,
        ))
    }
}

impl Module for UrlsModule {
    fn name(&self) -> &str {
        "urls"
    }

    fn routes(&self) -> Router {
        api::build_router(self.gate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use urlgate_core::{FixedIdentity, Identity};
    use urlgate_sql::SqliteStore;

    use crate::model::{CreateUrl, SimpleAccess};

    #[tokio::test]
    async fn test_module_wiring() {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let settings = GateSettings {
            site: "main".into(),
            aspects: Some(vec!["access".into()]),
            ..Default::default()
        };
        let module =
            UrlsModule::new(sql, &settings, Arc::new(FixedIdentity(Identity::user("ops").staff())))
                .unwrap();
        assert_eq!(module.name(), "urls");

        // Everything under the admin prefix needs a superuser here, which
        // the admin API itself must never be subject to.
        let svc = module.gate().service();
        let admin = svc.create_url(CreateUrl { path: "/admin/".into(), site: None }).unwrap();
        svc.set_simple_access(
            &admin.id,
            SimpleAccess {
                requires_superuser: true,
                ..Default::default()
            },
        )
        .unwrap();
        let shop = svc.create_url(CreateUrl { path: "/shop/".into(), site: None }).unwrap();
        svc.set_simple_access(
            &shop.id,
            SimpleAccess {
                requires_superuser: true,
                ..Default::default()
            },
        )
        .unwrap();

        let app = module.protect(
            Router::new()
                .nest("/admin", module.routes())
                .fallback(|| async { "page" }),
        );

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/admin/urls").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(Request::builder().uri("/shop/cart/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
