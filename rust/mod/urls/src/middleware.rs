//! The URL gate: resolve, evaluate, then continue, redirect or reject.

use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};

use urlgate_core::{Identity, IdentitySource, ServiceError};

use crate::config::GateSettings;
use crate::exclusions::ExclusionSet;
use crate::pipeline;
use crate::policy::{Outcome, RejectReason, RequestContext};
use crate::registry::AspectRegistry;
use crate::resolver::{Resolution, Resolver};
use crate::service::{UrlError, UrlService};

/// What the gate decided for one request.
#[derive(Debug, Clone)]
pub struct Decision {
    pub resolution: Option<Resolution>,
    pub outcome: Outcome,
}

/// Shared gate state. Everything but the registry is read-only.
pub struct UrlGate {
    service: Arc<UrlService>,
    resolver: Resolver,
    registry: RwLock<AspectRegistry>,
    identity: Arc<dyn IdentitySource>,
    site: String,
}

impl UrlGate {
    pub fn new(
        service: Arc<UrlService>,
        exclusions: Arc<ExclusionSet>,
        registry: AspectRegistry,
        identity: Arc<dyn IdentitySource>,
        site: &str,
    ) -> Self {
        Self {
            resolver: Resolver::new(service.clone(), exclusions),
            service,
            registry: RwLock::new(registry),
            identity,
            site: site.to_string(),
        }
    }

    /// Build a gate from `[gate]` settings.
    pub fn from_settings(
        service: Arc<UrlService>,
        settings: &GateSettings,
        identity: Arc<dyn IdentitySource>,
    ) -> Result<Self, UrlError> {
        let exclusions = ExclusionSet::from_settings(settings)?;
        let registry = AspectRegistry::from_names(settings.aspects.as_deref());
        Ok(Self::new(
            service,
            Arc::new(exclusions),
            registry,
            identity,
            &settings.site,
        ))
    }

    pub fn service(&self) -> &Arc<UrlService> {
        &self.service
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Snapshot of the mounted aspects.
    pub fn registry(&self) -> AspectRegistry {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the mounted aspects. Applies from the next request.
    pub fn set_registry(&self, registry: AspectRegistry) {
        *self.registry.write().unwrap_or_else(|e| e.into_inner()) = registry;
    }

    pub fn identify(&self, headers: &HeaderMap) -> Identity {
        self.identity.identify(headers)
    }

    /// Resolve `path` without evaluating any policy.
    pub fn resolve(&self, path: &str) -> Result<Option<Resolution>, UrlError> {
        let kinds = self.registry().kinds();
        self.resolver.resolve(path, &self.site, &kinds)
    }

    /// Resolve `path` and run the mounted policy tests over the result.
    ///
    /// A storage failure rejects the request.
    pub fn decide(&self, path: &str, identity: Identity) -> Decision {
        let registry = self.registry();
        let tests = registry.discovered_tests();

        let resolution = match self.resolver.resolve(path, &self.site, &registry.kinds()) {
            Ok(Some(r)) => r,
            Ok(None) => {
                return Decision {
                    resolution: None,
                    outcome: Outcome::Continue,
                };
            }
            Err(e) => {
                error!(path = %path, error = %e, "URL resolution failed");
                return Decision {
                    resolution: None,
                    outcome: Outcome::reject(RejectReason::Denied),
                };
            }
        };

        let ctx = RequestContext::new(path, identity);
        let outcome = pipeline::evaluate(&resolution.all, &tests, &ctx);
        debug!(
            path = %path,
            nearest = ?resolution.nearest().map(|n| n.path.as_str()),
            ?outcome,
            "URL gate decision"
        );

        Decision {
            resolution: Some(resolution),
            outcome,
        }
    }
}

/// Turn a terminal outcome into its response. `Continue` has none.
pub fn outcome_response(outcome: &Outcome) -> Option<Response> {
    match outcome {
        Outcome::Continue => None,
        Outcome::RedirectTo {
            location,
            permanent,
        } => {
            let status = if *permanent {
                StatusCode::MOVED_PERMANENTLY
            } else {
                StatusCode::FOUND
            };
            Some((status, [(header::LOCATION, location.clone())]).into_response())
        }
        // Every rejection looks the same to the client.
        Outcome::Reject { .. } => Some(ServiceError::generic_not_found().into_response()),
    }
}

/// Percent-decoded request path, as stored nodes hold it.
///
/// `None` when the decoded bytes are not UTF-8.
pub fn decoded_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|p| p.into_owned())
}

/// Axum middleware running the URL gate before the wrapped handlers.
///
/// The caller's [`Identity`] and, when the path was resolved, the
/// [`Resolution`] are stored as request extensions.
pub async fn url_gate_middleware(
    State(gate): State<Arc<UrlGate>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(path) = decoded_path(req.uri().path()) else {
        warn!(path = %req.uri().path(), "request path is not valid UTF-8");
        return ServiceError::generic_not_found().into_response();
    };
    let identity = gate.identify(req.headers());
    let decision = gate.decide(&path, identity.clone());

    if let Some(resp) = outcome_response(&decision.outcome) {
        return resp;
    }

    req.extensions_mut().insert(identity);
    if let Some(resolution) = decision.resolution {
        req.extensions_mut().insert(resolution);
    }
    next.run(req).await
}
