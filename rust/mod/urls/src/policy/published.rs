use crate::model::UrlNode;
use crate::policy::{Outcome, PolicyTest, RejectReason, RequestContext, Verdict};
use crate::registry::AspectKind;

/// Denies nodes outside their publishing window.
pub struct PublishedTest;

impl PolicyTest for PublishedTest {
    fn name(&self) -> &'static str {
        "published"
    }

    fn kind(&self) -> AspectKind {
        AspectKind::Visibility
    }

    fn check(&self, node: &UrlNode, ctx: &RequestContext) -> Verdict {
        match &node.aspects.visibility {
            None => Verdict::Abstain,
            Some(v) if v.is_published_at(ctx.now) => Verdict::Allow,
            Some(_) => Verdict::Deny,
        }
    }

    fn on_deny(&self, _node: &UrlNode) -> Option<Outcome> {
        Some(Outcome::reject(RejectReason::NotPublished))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Visibility;
    use chrono::{Duration, Utc};
    use urlgate_core::Identity;

    #[test]
    fn test_window() {
        let ctx = RequestContext::new("/old/", Identity::anonymous());
        let mut node = UrlNode::transient("s", "/old/");
        assert_eq!(PublishedTest.check(&node, &ctx), Verdict::Abstain);

        node.aspects.visibility = Some(Visibility {
            publish_on: ctx.now - Duration::days(10),
            unpublish_on: Some(ctx.now - Duration::days(1)),
        });
        assert_eq!(PublishedTest.check(&node, &ctx), Verdict::Deny);
        assert_eq!(
            PublishedTest.on_deny(&node),
            Some(Outcome::reject(RejectReason::NotPublished))
        );

        node.aspects.visibility = Some(Visibility::starting(Utc::now() - Duration::hours(1)));
        assert_eq!(PublishedTest.check(&node, &ctx), Verdict::Allow);
        assert!(PublishedTest.on_allow(&node).is_none());
    }
}
