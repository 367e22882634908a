//! Request path → stored nodes.
//!
//! One `path IN (...)` query fetches every stored node on the request's
//! ancestry, then one `url_id IN (...)` query per mounted aspect loads the
//! aspects the policy tests will read.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::exclusions::ExclusionSet;
use crate::model::UrlNode;
use crate::path;
use crate::registry::AspectKind;
use crate::service::{UrlError, UrlService};

/// Paths to look up for a request: its ancestry including itself, plus
/// the raw path when it is not separator-terminated.
pub fn lookup_paths(raw: &str) -> Result<Vec<String>, UrlError> {
    let raw = path::validate_path(raw)?;
    let mut paths = path::ancestry_of(&raw, true);
    if !paths.contains(&raw) {
        paths.push(raw);
    }
    Ok(paths)
}

/// Stored nodes matching a request path. Attached to the request for
/// downstream handlers.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub path: String,
    /// The node stored at exactly this path, if any.
    pub exact: Option<UrlNode>,
    /// Stored proper ancestors, nearest first.
    pub ancestors: Vec<UrlNode>,
    /// `exact` followed by `ancestors`.
    pub all: Vec<UrlNode>,
}

impl Resolution {
    pub fn nearest(&self) -> Option<&UrlNode> {
        self.all.first()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

pub struct Resolver {
    service: Arc<UrlService>,
    exclusions: Arc<ExclusionSet>,
}

impl Resolver {
    pub fn new(service: Arc<UrlService>, exclusions: Arc<ExclusionSet>) -> Self {
        Self {
            service,
            exclusions,
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_excluded(path)
    }

    /// Resolve `raw` on `site`, loading the aspects of `kinds`.
    ///
    /// `Ok(None)` means the gate does not apply: the path is excluded or
    /// is not a valid URL path.
    pub fn resolve(
        &self,
        raw: &str,
        site: &str,
        kinds: &[AspectKind],
    ) -> Result<Option<Resolution>, UrlError> {
        if self.is_excluded(raw) {
            debug!(path = %raw, "path excluded from URL gate");
            return Ok(None);
        }

        let paths = match lookup_paths(raw) {
            Ok(p) => p,
            Err(UrlError::Validation(msg)) => {
                debug!(path = %raw, %msg, "path not resolvable");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let raw = raw.trim();
        let mut nodes = self.service.nodes_for_paths(site, &paths)?;
        self.service.load_aspects(&mut nodes, kinds)?;

        let self_depth = path::depth(raw);
        let normalized = path::normalized(raw);
        let exact = nodes
            .iter()
            .position(|n| n.path == raw)
            .or_else(|| nodes.iter().position(|n| n.path == normalized))
            .map(|i| nodes[i].clone());
        let ancestors: Vec<UrlNode> = nodes.into_iter().filter(|n| n.depth < self_depth).collect();
        let all = exact.iter().cloned().chain(ancestors.iter().cloned()).collect();

        debug!(
            path = %raw,
            exact = exact.is_some(),
            ancestors = ancestors.len(),
            "resolved request path"
        );

        Ok(Some(Resolution {
            path: raw.to_string(),
            exact,
            ancestors,
            all,
        }))
    }
}
