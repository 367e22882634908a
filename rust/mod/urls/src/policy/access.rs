use crate::model::UrlNode;
use crate::policy::{Outcome, PolicyTest, RejectReason, RequestContext, Verdict};
use crate::registry::AspectKind;

/// Login, staff and superuser requirements.
pub struct SimpleAccessTest;

impl PolicyTest for SimpleAccessTest {
    fn name(&self) -> &'static str {
        "simple_access"
    }

    fn kind(&self) -> AspectKind {
        AspectKind::SimpleAccess
    }

    fn check(&self, node: &UrlNode, ctx: &RequestContext) -> Verdict {
        match &node.aspects.access {
            Some(a) if a.has_restriction() => {
                if a.allows(&ctx.identity) {
                    Verdict::Allow
                } else {
                    Verdict::Deny
                }
            }
            _ => Verdict::Abstain,
        }
    }

    fn on_deny(&self, _node: &UrlNode) -> Option<Outcome> {
        Some(Outcome::reject(RejectReason::Denied))
    }
}

/// Restricts a node to members of any listed group.
///
/// Has no deny hook: a denial is left for the pipeline to collect.
pub struct GroupAccessTest;

impl PolicyTest for GroupAccessTest {
    fn name(&self) -> &'static str {
        "group_access"
    }

    fn kind(&self) -> AspectKind {
        AspectKind::GroupAccess
    }

    fn check(&self, node: &UrlNode, ctx: &RequestContext) -> Verdict {
        let groups = &node.aspects.access_groups;
        if groups.is_empty() {
            return Verdict::Abstain;
        }
        if !ctx.identity.is_authenticated() {
            return Verdict::Deny;
        }
        if ctx.identity.groups.iter().any(|g| groups.contains(g)) {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }
}

/// Restricts a node to the listed users.
pub struct UserAccessTest;

impl PolicyTest for UserAccessTest {
    fn name(&self) -> &'static str {
        "user_access"
    }

    fn kind(&self) -> AspectKind {
        AspectKind::UserAccess
    }

    fn check(&self, node: &UrlNode, ctx: &RequestContext) -> Verdict {
        let users = &node.aspects.access_users;
        if users.is_empty() {
            return Verdict::Abstain;
        }
        match &ctx.identity.user_id {
            Some(id) if users.contains(id) => Verdict::Allow,
            _ => Verdict::Deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleAccess;
    use urlgate_core::Identity;

    fn ctx(identity: Identity) -> RequestContext {
        RequestContext::new("/x/", identity)
    }

    #[test]
    fn test_simple_access() {
        let mut node = UrlNode::transient("s", "/secret/");
        assert_eq!(SimpleAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Abstain);

        node.aspects.access = Some(SimpleAccess::default());
        assert_eq!(SimpleAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Abstain);

        node.aspects.access = Some(SimpleAccess {
            requires_authenticated: true,
            ..Default::default()
        });
        assert_eq!(SimpleAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Deny);
        assert_eq!(SimpleAccessTest.check(&node, &ctx(Identity::user("u"))), Verdict::Allow);
        assert_eq!(
            SimpleAccessTest.on_deny(&node),
            Some(Outcome::reject(RejectReason::Denied))
        );
    }

    #[test]
    fn test_group_access() {
        let mut node = UrlNode::transient("s", "/team/");
        assert_eq!(GroupAccessTest.check(&node, &ctx(Identity::user("u"))), Verdict::Abstain);

        node.aspects.access_groups = vec!["editors".into()];
        assert_eq!(GroupAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Deny);
        assert_eq!(GroupAccessTest.check(&node, &ctx(Identity::user("u"))), Verdict::Deny);
        let editor = Identity::user("u").with_groups(["readers", "editors"]);
        assert_eq!(GroupAccessTest.check(&node, &ctx(editor)), Verdict::Allow);
        assert!(GroupAccessTest.on_deny(&node).is_none());
    }

    #[test]
    fn test_user_access() {
        let mut node = UrlNode::transient("s", "/me/");
        assert_eq!(UserAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Abstain);

        node.aspects.access_users = vec!["alice".into()];
        assert_eq!(UserAccessTest.check(&node, &ctx(Identity::anonymous())), Verdict::Deny);
        assert_eq!(UserAccessTest.check(&node, &ctx(Identity::user("bob"))), Verdict::Deny);
        assert_eq!(UserAccessTest.check(&node, &ctx(Identity::user("alice"))), Verdict::Allow);
        assert!(UserAccessTest.on_deny(&node).is_none());
    }
}
