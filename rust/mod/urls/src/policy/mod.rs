//! Per-URL policy tests and the values they produce.
//!
//! A test inspects one node's aspects and returns a [`Verdict`]. Allow and
//! Deny may carry a terminal [`Outcome`] through `on_allow` / `on_deny`;
//! the pipeline decides what to do with verdicts that have none.

mod access;
mod published;
mod redirect;

pub use access::{GroupAccessTest, SimpleAccessTest, UserAccessTest};
pub use published::PublishedTest;
pub use redirect::RedirectTest;

use chrono::{DateTime, Utc};
use serde::Serialize;
use urlgate_core::Identity;

use crate::model::UrlNode;
use crate::registry::AspectKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Deny,
    /// The node has nothing for this test to look at.
    Abstain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotPublished,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Continue,
    RedirectTo { location: String, permanent: bool },
    Reject { reason: RejectReason },
}

impl Outcome {
    pub fn reject(reason: RejectReason) -> Self {
        Outcome::Reject { reason }
    }
}

/// What a policy test may know about the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub identity: Identity,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(path: &str, identity: Identity) -> Self {
        Self {
            path: path.to_string(),
            identity,
            now: Utc::now(),
        }
    }
}

pub trait PolicyTest: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> AspectKind;

    fn check(&self, node: &UrlNode, ctx: &RequestContext) -> Verdict;

    fn on_allow(&self, _node: &UrlNode) -> Option<Outcome> {
        None
    }

    fn on_deny(&self, _node: &UrlNode) -> Option<Outcome> {
        None
    }
}
