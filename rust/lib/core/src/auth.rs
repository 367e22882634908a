//! Request identity for the URL gate.
//!
//! The gate does NOT depend on any specific authentication scheme.
//! It only knows this trait. The concrete implementation is injected
//! at startup time.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Who is making a request, as far as URL policies are concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id; `None` for anonymous requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Group ids the user belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub is_staff: bool,

    #[serde(default)]
    pub is_superuser: bool,
}

impl Identity {
    /// The anonymous identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated user with no groups and no elevated flags.
    pub fn user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Pluggable identity extraction. The URL gate calls this once per
/// request before any policy runs.
///
/// Implementations must never fail: a request that carries no usable
/// credentials is simply anonymous.
pub trait IdentitySource: Send + Sync + 'static {
    fn identify(&self, headers: &HeaderMap) -> Identity;
}

/// Treats every request as anonymous. Used for public-only deployments.
pub struct Anonymous;

impl IdentitySource for Anonymous {
    fn identify(&self, _headers: &HeaderMap) -> Identity {
        Identity::anonymous()
    }
}

/// Returns the same identity for every request. Used for testing.
pub struct FixedIdentity(pub Identity);

impl IdentitySource for FixedIdentity {
    fn identify(&self, _headers: &HeaderMap) -> Identity {
        self.0.clone()
    }
}
