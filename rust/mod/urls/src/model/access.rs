use serde::{Deserialize, Serialize};
use urlgate_core::Identity;

/// Role-flag restriction attached 1:1 to a URL node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAccess {
    /// Login required.
    #[serde(default)]
    pub requires_authenticated: bool,

    /// Only staff.
    #[serde(default)]
    pub requires_staff: bool,

    /// Only administrators.
    #[serde(default)]
    pub requires_superuser: bool,
}

impl SimpleAccess {
    pub fn has_restriction(&self) -> bool {
        self.requires_authenticated || self.requires_staff || self.requires_superuser
    }

    /// Every set flag must be satisfied by `identity`.
    pub fn allows(&self, identity: &Identity) -> bool {
        (!self.requires_authenticated || identity.is_authenticated())
            && (!self.requires_staff || identity.is_staff)
            && (!self.requires_superuser || identity.is_superuser)
    }
}

/// Input for restricting a URL to one more group.
#[derive(Debug, Clone, Deserialize)]
pub struct AddGroupRestriction {
    pub group_id: String,
}

/// Input for restricting a URL to one more user.
#[derive(Debug, Clone, Deserialize)]
pub struct AddUserRestriction {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_restriction() {
        assert!(!SimpleAccess::default().has_restriction());
        let a = SimpleAccess {
            requires_staff: true,
            ..Default::default()
        };
        assert!(a.has_restriction());
    }

    #[test]
    fn test_allows() {
        let login = SimpleAccess {
            requires_authenticated: true,
            ..Default::default()
        };
        assert!(!login.allows(&Identity::anonymous()));
        assert!(login.allows(&Identity::user("u")));

        let staff = SimpleAccess {
            requires_staff: true,
            ..Default::default()
        };
        assert!(!staff.allows(&Identity::user("u")));
        assert!(staff.allows(&Identity::user("u").staff()));

        let admin = SimpleAccess {
            requires_authenticated: true,
            requires_superuser: true,
            ..Default::default()
        };
        assert!(!admin.allows(&Identity::user("u").staff()));
        assert!(admin.allows(&Identity::user("u").superuser()));

        assert!(SimpleAccess::default().allows(&Identity::anonymous()));
    }
}
