use crate::model::UrlNode;
use crate::policy::{Outcome, PolicyTest, RequestContext, Verdict};
use crate::registry::AspectKind;

/// Sends requests for a node with a redirect somewhere else.
pub struct RedirectTest;

impl PolicyTest for RedirectTest {
    fn name(&self) -> &'static str {
        "redirect"
    }

    fn kind(&self) -> AspectKind {
        AspectKind::Redirect
    }

    fn check(&self, node: &UrlNode, _ctx: &RequestContext) -> Verdict {
        match &node.aspects.redirect {
            Some(r) if !r.target.is_empty() => Verdict::Allow,
            _ => Verdict::Abstain,
        }
    }

    fn on_allow(&self, node: &UrlNode) -> Option<Outcome> {
        node.aspects.redirect.as_ref().map(|r| Outcome::RedirectTo {
            location: r.target.clone(),
            permanent: r.is_permanent,
        })
    }
}
