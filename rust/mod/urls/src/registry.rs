//! The closed set of URL aspects and the ordered registry of mounted ones.
//!
//! Each [`AspectKind`] pairs one relation (the table its rows live in), one
//! policy test, one admin display column and one admin list filter. The
//! registry is built once from configuration and injected wherever the
//! mounted set matters; nothing here is global.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::UrlNode;
use crate::policy::{
    GroupAccessTest, PolicyTest, PublishedTest, RedirectTest, SimpleAccessTest, UserAccessTest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectKind {
    Redirect,
    Visibility,
    SimpleAccess,
    GroupAccess,
    UserAccess,
}

impl AspectKind {
    /// Every kind, in the default mount order.
    pub const ALL: [AspectKind; 5] = [
        AspectKind::Redirect,
        AspectKind::Visibility,
        AspectKind::SimpleAccess,
        AspectKind::GroupAccess,
        AspectKind::UserAccess,
    ];

    pub fn relation_name(self) -> &'static str {
        match self {
            AspectKind::Redirect => "redirect",
            AspectKind::Visibility => "visibility",
            AspectKind::SimpleAccess => "access",
            AspectKind::GroupAccess => "access_groups",
            AspectKind::UserAccess => "access_users",
        }
    }

    fn table(self) -> &'static str {
        match self {
            AspectKind::Redirect => "url_redirect",
            AspectKind::Visibility => "url_visibility",
            AspectKind::SimpleAccess => "url_access",
            AspectKind::GroupAccess => "url_access_groups",
            AspectKind::UserAccess => "url_access_users",
        }
    }

    pub fn kind_name(self) -> &'static str {
        match self {
            AspectKind::Redirect => "redirect",
            AspectKind::Visibility => "visibility",
            AspectKind::SimpleAccess => "simple_access",
            AspectKind::GroupAccess => "group_access",
            AspectKind::UserAccess => "user_access",
        }
    }

    /// Look a kind up by relation name or by its snake_case kind name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.relation_name() == name || k.kind_name() == name)
    }

    /// Admin column heading.
    pub fn label(self) -> &'static str {
        match self {
            AspectKind::Redirect => "Redirect",
            AspectKind::Visibility => "Published",
            AspectKind::SimpleAccess => "Login Restricted",
            AspectKind::GroupAccess => "Group Restricted",
            AspectKind::UserAccess => "User Restricted",
        }
    }

    pub fn policy_test(self) -> Box<dyn PolicyTest> {
        match self {
            AspectKind::Redirect => Box::new(RedirectTest),
            AspectKind::Visibility => Box::new(PublishedTest),
            AspectKind::SimpleAccess => Box::new(SimpleAccessTest),
            AspectKind::GroupAccess => Box::new(GroupAccessTest),
            AspectKind::UserAccess => Box::new(UserAccessTest),
        }
    }

    /// Admin column value for a node with this kind's aspects loaded.
    ///
    /// "Published" reads true when there is no window at all; a window
    /// only means "published" while it is open.
    pub fn display(self, node: &UrlNode) -> bool {
        let a = &node.aspects;
        match self {
            AspectKind::Redirect => a.redirect.as_ref().is_some_and(|r| !r.target.is_empty()),
            AspectKind::Visibility => a.visibility.as_ref().is_none_or(|v| v.is_published()),
            AspectKind::SimpleAccess => a.access.as_ref().is_some_and(|x| x.has_restriction()),
            AspectKind::GroupAccess => !a.access_groups.is_empty(),
            AspectKind::UserAccess => !a.access_users.is_empty(),
        }
    }

    pub fn filter(self) -> AspectFilter {
        AspectFilter { kind: self }
    }
}

/// Yes/No admin list filter on whether a node has a kind's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectFilter {
    pub kind: AspectKind,
}

impl AspectFilter {
    /// Query-string parameter, e.g. `has_redirect`.
    pub fn parameter_name(&self) -> String {
        format!("has_{}", self.kind.relation_name())
    }

    pub fn title(&self) -> &'static str {
        self.kind.label()
    }

    pub fn lookups(&self) -> [(&'static str, &'static str); 2] {
        [("1", "Yes"), ("0", "No")]
    }

    /// Parse a lookup value into the yes/no choice.
    pub fn parse(&self, value: &str) -> Option<bool> {
        match value.trim() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }

    /// SQL predicate over `urls.id`. Takes no parameters.
    pub fn clause(&self, yes: bool) -> String {
        format!(
            "{}EXISTS (SELECT 1 FROM {} a WHERE a.url_id = urls.id)",
            if yes { "" } else { "NOT " },
            self.kind.table()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectDescriptor {
    pub kind: AspectKind,
    pub relation_name: &'static str,
    pub label: &'static str,
}

impl From<AspectKind> for AspectDescriptor {
    fn from(kind: AspectKind) -> Self {
        Self {
            kind,
            relation_name: kind.relation_name(),
            label: kind.label(),
        }
    }
}

/// A policy test together with the relation it reads.
pub struct DiscoveredTest {
    pub kind: AspectKind,
    pub relation_name: &'static str,
    pub test: Box<dyn PolicyTest>,
}

/// Ordered set of mounted aspects. Order is evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspectRegistry {
    descriptors: Vec<AspectDescriptor>,
}

impl AspectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every aspect, in the default order.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        for kind in AspectKind::ALL {
            r.mount(kind);
        }
        r
    }

    /// Build from configured names. Unknown names are skipped; an empty or
    /// missing list leaves the registry empty so no URL policies run.
    pub fn from_names(names: Option<&[String]>) -> Self {
        let mut r = Self::new();
        let Some(names) = names.filter(|n| !n.is_empty()) else {
            warn!("no URL aspects configured; URL policies are disabled");
            return r;
        };
        for name in names {
            match AspectKind::from_name(name) {
                Some(kind) => r.mount(kind),
                None => warn!(aspect = %name, "unknown URL aspect in configuration, skipping"),
            }
        }
        if r.is_empty() {
            warn!("no usable URL aspects configured; URL policies are disabled");
        }
        r
    }

    /// Append a kind. Mounting an already mounted kind is a no-op.
    pub fn mount(&mut self, kind: AspectKind) {
        if !self.contains(kind) {
            self.descriptors.push(kind.into());
        }
    }

    pub fn unmount(&mut self, kind: AspectKind) {
        self.descriptors.retain(|d| d.kind != kind);
    }

    pub fn contains(&self, kind: AspectKind) -> bool {
        self.descriptors.iter().any(|d| d.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[AspectDescriptor] {
        &self.descriptors
    }

    pub fn kinds(&self) -> Vec<AspectKind> {
        self.descriptors.iter().map(|d| d.kind).collect()
    }

    pub fn discovered_tests(&self) -> Vec<DiscoveredTest> {
        self.descriptors
            .iter()
            .map(|d| DiscoveredTest {
                kind: d.kind,
                relation_name: d.relation_name,
                test: d.kind.policy_test(),
            })
            .collect()
    }

    /// Relation names to eager-load for a resolution.
    pub fn relations(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.relation_name).collect()
    }

    /// Admin display columns for a node, in mount order.
    pub fn display_columns(&self, node: &UrlNode) -> Vec<(&'static str, bool)> {
        self.descriptors
            .iter()
            .map(|d| (d.label, d.kind.display(node)))
            .collect()
    }

    pub fn filters(&self) -> Vec<AspectFilter> {
        self.descriptors.iter().map(|d| d.kind.filter()).collect()
    }
}
