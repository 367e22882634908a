use serde::{Deserialize, Serialize};

use crate::model::{Redirect, SimpleAccess, Visibility};
use crate::path;

/// A stored URL path for one site.
///
/// Ancestry is never stored: it is derived from `path` on demand. `depth`
/// is the only tree-shaped value persisted, so direct children and
/// siblings can be found with an integer comparison.
#[derive(Debug, Clone, Serialize)]
pub struct UrlNode {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Owning site / tenant.
    pub site: String,

    /// Trimmed path, always starting with `/`.
    pub path: String,

    /// Ancestry length including self (root = 1).
    pub depth: usize,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last modification timestamp.
    pub modified_at: String,

    /// Aspect rows loaded alongside the node. Only the relations that were
    /// asked for are populated.
    #[serde(skip_serializing_if = "Aspects::is_empty")]
    pub aspects: Aspects,
}

/// Aspect records attached to a [`UrlNode`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aspects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<SimpleAccess>,

    /// Group ids the node is restricted to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_groups: Vec<String>,

    /// User ids the node is restricted to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_users: Vec<String>,
}

impl Aspects {
    pub fn is_empty(&self) -> bool {
        self.visibility.is_none()
            && self.redirect.is_none()
            && self.access.is_none()
            && self.access_groups.is_empty()
            && self.access_users.is_empty()
    }
}

impl UrlNode {
    /// An unsaved node, used to reason about a request path that may not
    /// be stored at all.
    pub fn transient(site: &str, path: &str) -> Self {
        Self {
            id: String::new(),
            site: site.to_string(),
            path: path.to_string(),
            depth: path::depth(path),
            created_at: String::new(),
            modified_at: String::new(),
            aspects: Aspects::default(),
        }
    }

    /// Ancestor paths from the root down; see [`path::ancestry_of`].
    pub fn path_ancestry(&self, include_self: bool) -> Vec<String> {
        path::ancestry_of(&self.path, include_self)
    }

    pub fn is_root(&self) -> bool {
        path::is_root_path(&self.path)
    }

    pub fn is_child_node(&self) -> bool {
        !self.is_root()
    }

    pub fn is_same_as(&self, other: &UrlNode) -> bool {
        self.path == other.path
    }

    /// `other` lies strictly below this node.
    pub fn is_ancestor_of(&self, other: &UrlNode) -> bool {
        path::is_descendant_path(&other.path, &self.path)
    }

    /// This node lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &UrlNode) -> bool {
        path::is_descendant_path(&self.path, &other.path)
    }

    /// This node lies exactly one segment below `other`.
    pub fn is_child_of(&self, other: &UrlNode) -> bool {
        self.is_descendant_of(other)
            && path::segments(&self.path).len() == path::segments(&other.path).len() + 1
    }

    pub fn is_parent_of(&self, other: &UrlNode) -> bool {
        other.is_child_of(self)
    }

    /// Same depth under the same parent. A node is not its own sibling.
    pub fn is_sibling_of(&self, other: &UrlNode) -> bool {
        path::is_sibling_path(&self.path, &other.path)
    }
}

/// Input for creating a URL node.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUrl {
    pub path: String,
    /// Defaults to the service's current site.
    #[serde(default)]
    pub site: Option<String>,
}

/// Input for changing a URL node's path.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUrl {
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(p: &str) -> UrlNode {
        UrlNode::transient("s", p)
    }

    #[test]
    fn test_root() {
        assert!(node("/").is_root());
        assert!(!node("/").is_child_node());
        assert!(node("/a/").is_child_node());
        assert!(node("/a/").path_ancestry(false) == vec!["/"]);
        assert!(node("/").path_ancestry(false).is_empty());
    }

    #[test]
    fn test_ancestor_descendant_are_converses() {
        let paths = ["/", "/a/", "/a/b/", "/a/b/c/", "/b/", "/ab/"];
        for a in paths {
            for b in paths {
                if a == b {
                    continue;
                }
                let (na, nb) = (node(a), node(b));
                assert_eq!(na.is_descendant_of(&nb), nb.is_ancestor_of(&na), "{a} {b}");
                assert_eq!(na.is_child_of(&nb), nb.is_parent_of(&na), "{a} {b}");
                assert!(!(na.is_descendant_of(&nb) && nb.is_descendant_of(&na)), "{a} {b}");
                if na.is_child_of(&nb) {
                    assert!(na.is_descendant_of(&nb));
                    assert!(!nb.is_child_of(&na));
                }
            }
        }
    }

    #[test]
    fn test_child_of() {
        assert!(node("/a/b/").is_child_of(&node("/a/")));
        assert!(node("/a/").is_child_of(&node("/")));
        assert!(!node("/a/b/c/").is_child_of(&node("/a/")));
        assert!(node("/a/b/c/").is_descendant_of(&node("/a/")));
        assert!(!node("/a/").is_child_of(&node("/a/b/")));
    }

    #[test]
    fn test_sibling_is_symmetric() {
        let paths = ["/", "/a/", "/b/", "/a/x/", "/a/y/", "/b/x/"];
        for a in paths {
            for b in paths {
                assert_eq!(
                    node(a).is_sibling_of(&node(b)),
                    node(b).is_sibling_of(&node(a)),
                    "{a} {b}"
                );
            }
        }
        assert!(node("/a/x/").is_sibling_of(&node("/a/y/")));
        assert!(!node("/a/x/").is_sibling_of(&node("/b/x/")));
    }

    #[test]
    fn test_node_is_not_its_own_sibling() {
        let x = node("/a/x/");
        assert!(!x.is_sibling_of(&x));
        assert!(!x.is_sibling_of(&node("/a/x/")));
    }

    #[test]
    fn test_same_as() {
        assert!(node("/a/").is_same_as(&node("/a/")));
        assert!(!node("/a/").is_same_as(&node("/a")));
    }

    #[test]
    fn test_aspects_skipped_when_empty() {
        let json = serde_json::to_value(node("/a/")).unwrap();
        assert!(json.get("aspects").is_none());
        assert_eq!(json["depth"], 2);
    }
}
