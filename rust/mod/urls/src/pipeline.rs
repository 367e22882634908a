//! Runs the mounted policy tests over a resolution's nodes.

use tracing::{debug, warn};

use crate::model::UrlNode;
use crate::policy::{Outcome, RejectReason, RequestContext, Verdict};
use crate::registry::DiscoveredTest;

/// Evaluate `tests` against `nodes`, nearest node first, tests in registry
/// order within each node.
///
/// The first Allow or Deny whose test supplies an outcome for it ends the
/// walk. A Deny with no outcome is remembered and the walk goes on; if any
/// were seen the request is rejected once every node has been checked.
pub fn evaluate(nodes: &[UrlNode], tests: &[DiscoveredTest], ctx: &RequestContext) -> Outcome {
    let mut denied = 0usize;

    for node in nodes {
        for t in tests {
            let verdict = t.test.check(node, ctx);
            debug!(
                path = %ctx.path,
                node = %node.path,
                test = t.test.name(),
                ?verdict,
                "policy check"
            );

            let hook = match verdict {
                Verdict::Abstain => continue,
                Verdict::Allow => t.test.on_allow(node),
                Verdict::Deny => {
                    let outcome = t.test.on_deny(node);
                    if outcome.is_none() {
                        warn!(
                            path = %ctx.path,
                            node = %node.path,
                            test = t.test.name(),
                            "unhandled denial"
                        );
                        denied += 1;
                    }
                    outcome
                }
            };

            if let Some(outcome) = hook {
                return outcome;
            }
        }
    }

    if denied > 0 {
        Outcome::reject(RejectReason::Denied)
    } else {
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::{Redirect, SimpleAccess, Visibility};
    use crate::policy::PolicyTest;
    use crate::registry::{AspectKind, AspectRegistry};
    use chrono::Duration;
    use urlgate_core::Identity;

    fn node(path: &str) -> UrlNode {
        UrlNode::transient("s", path)
    }

    fn ctx(identity: Identity) -> RequestContext {
        RequestContext::new("/a/b/c/", identity)
    }

    /// Records every (node, test) pair it is asked about.
    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl PolicyTest for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn kind(&self) -> AspectKind {
            AspectKind::Redirect
        }

        fn check(&self, node: &UrlNode, _ctx: &RequestContext) -> Verdict {
            self.seen.lock().unwrap().push(format!("{}:{}", node.path, self.label));
            Verdict::Abstain
        }
    }

    #[test]
    fn test_nearest_node_first_then_registry_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tests: Vec<DiscoveredTest> = ["t1", "t2"]
            .into_iter()
            .map(|label| DiscoveredTest {
                kind: AspectKind::Redirect,
                relation_name: "redirect",
                test: Box::new(Recorder {
                    label,
                    seen: seen.clone(),
                }),
            })
            .collect();
        let nodes = vec![node("/a/b/"), node("/a/"), node("/")];

        assert_eq!(evaluate(&nodes, &tests, &ctx(Identity::anonymous())), Outcome::Continue);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["/a/b/:t1", "/a/b/:t2", "/a/:t1", "/a/:t2", "/:t1", "/:t2"]
        );
    }

    #[test]
    fn test_no_nodes_or_no_tests_continue() {
        let tests = AspectRegistry::with_defaults().discovered_tests();
        assert_eq!(evaluate(&[], &tests, &ctx(Identity::anonymous())), Outcome::Continue);

        let mut n = node("/secret/");
        n.aspects.access = Some(SimpleAccess {
            requires_authenticated: true,
            ..Default::default()
        });
        assert_eq!(evaluate(&[n], &[], &ctx(Identity::anonymous())), Outcome::Continue);
    }

    #[test]
    fn test_redirect_on_nearer_node_wins() {
        let tests = AspectRegistry::with_defaults().discovered_tests();
        let mut near = node("/a/b/");
        near.aspects.redirect = Some(Redirect {
            target: "/moved/".into(),
            is_permanent: false,
        });
        let mut far = node("/a/");
        far.aspects.access = Some(SimpleAccess {
            requires_staff: true,
            ..Default::default()
        });

        assert_eq!(
            evaluate(&[near, far], &tests, &ctx(Identity::anonymous())),
            Outcome::RedirectTo {
                location: "/moved/".into(),
                permanent: false,
            }
        );
    }

    #[test]
    fn test_unpublished_short_circuits() {
        let tests = AspectRegistry::with_defaults().discovered_tests();
        let mut n = node("/old/");
        let now = chrono::Utc::now();
        n.aspects.visibility = Some(Visibility {
            publish_on: now - Duration::days(10),
            unpublish_on: Some(now - Duration::days(1)),
        });
        assert_eq!(
            evaluate(&[n], &tests, &ctx(Identity::anonymous())),
            Outcome::reject(RejectReason::NotPublished)
        );
    }

    #[test]
    fn test_denials_accumulate_across_nodes() {
        let tests = AspectRegistry::with_defaults().discovered_tests();
        let mut near = node("/a/b/");
        near.aspects.access_users = vec!["alice".into()];
        let mut far = node("/a/");
        far.aspects.access_groups = vec!["editors".into()];

        // Allowed on the near node, denied on the ancestor.
        let alice = Identity::user("alice");
        assert_eq!(
            evaluate(&[near.clone(), far.clone()], &tests, &ctx(alice)),
            Outcome::reject(RejectReason::Denied)
        );

        let editor_alice = Identity::user("alice").with_groups(["editors"]);
        assert_eq!(
            evaluate(&[near, far], &tests, &ctx(editor_alice)),
            Outcome::Continue
        );
    }
}
