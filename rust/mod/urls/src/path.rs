//! Path ancestry, derived purely from slash-delimited strings.
//!
//! Nothing here touches storage: a path's ancestors, depth and its
//! relationship to another path are all computed from the segments.

use crate::service::UrlError;

pub const PATH_SEP: char = '/';
pub const ROOT_PATH: &str = "/";

/// Trim a raw path and check that it is usable as a stored URL path.
pub fn validate_path(raw: &str) -> Result<String, UrlError> {
    let path = raw.trim();
    if path.is_empty() {
        return Err(UrlError::Validation("path cannot be empty".into()));
    }
    if !path.starts_with(PATH_SEP) {
        return Err(UrlError::Validation(format!(
            "invalid URL root: path must start with '{}'",
            PATH_SEP
        )));
    }
    Ok(path.to_string())
}

/// Non-empty segments of a path: "/a//b/c" → ["a", "b", "c"].
pub fn segments(path: &str) -> Vec<&str> {
    path.split(PATH_SEP).filter(|s| !s.is_empty()).collect()
}

fn wrap(parts: &[&str]) -> String {
    if parts.is_empty() {
        ROOT_PATH.to_string()
    } else {
        format!("{sep}{}{sep}", parts.join("/"), sep = PATH_SEP)
    }
}

/// Separator-wrapped form of a path: "/a/b" → "/a/b/", "" → "/".
pub fn normalized(path: &str) -> String {
    wrap(&segments(path))
}

/// Ancestor paths ordered from the root down.
///
/// "/a/b/" → ["/", "/a/"], or ["/", "/a/", "/a/b/"] with `include_self`.
/// The root has no proper ancestors.
pub fn ancestry_of(path: &str, include_self: bool) -> Vec<String> {
    let parts = segments(path);
    let upto = if include_self {
        parts.len()
    } else if parts.is_empty() {
        return Vec::new();
    } else {
        parts.len() - 1
    };

    let mut out = Vec::with_capacity(upto + 1);
    out.push(ROOT_PATH.to_string());
    for i in 1..=upto {
        out.push(wrap(&parts[..i]));
    }
    out
}

/// Number of ancestry entries including the path itself (root = 1).
pub fn depth(path: &str) -> usize {
    segments(path).len() + 1
}

/// Nearest proper ancestor, `None` for the root.
pub fn parent_path(path: &str) -> Option<String> {
    ancestry_of(path, false).pop()
}

pub fn is_root_path(path: &str) -> bool {
    segments(path).is_empty()
}

/// True if `path` lies strictly below `of`.
///
/// Compares the separator-wrapped forms so "/ab/" is not mistaken for a
/// descendant of "/a".
pub fn is_descendant_path(path: &str, of: &str) -> bool {
    let (path, of) = (normalized(path), normalized(of));
    path.starts_with(&of) && path.len() > of.len()
}

/// Same number of segments (at least one) and the same parent prefix.
pub fn is_sibling_path(a: &str, b: &str) -> bool {
    let (a, b) = (segments(a), segments(b));
    if a.len() != b.len() || a.is_empty() || a == b {
        return false;
    }
    a[..a.len() - 1] == b[..b.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert_eq!(validate_path("  /a/b/ ").unwrap(), "/a/b/");
        assert_eq!(validate_path("/").unwrap(), "/");
        assert!(validate_path("").is_err());
        assert!(validate_path("   ").is_err());
        assert!(validate_path("a/b/").is_err());
        assert!(validate_path("http://example.com/").is_err());
    }

    #[test]
    fn test_ancestry_of() {
        assert_eq!(ancestry_of("/a/b/c/", false), vec!["/", "/a/", "/a/b/"]);
        assert_eq!(
            ancestry_of("/a/b/c/", true),
            vec!["/", "/a/", "/a/b/", "/a/b/c/"]
        );
        assert_eq!(ancestry_of("/a", true), vec!["/", "/a/"]);
        assert_eq!(ancestry_of("/a/", false), vec!["/"]);
    }

    #[test]
    fn test_root_ancestry() {
        assert!(ancestry_of("/", false).is_empty());
        assert_eq!(ancestry_of("/", true), vec!["/"]);
        assert_eq!(depth("/"), 1);
        assert_eq!(parent_path("/"), None);
    }

    #[test]
    fn test_ancestry_shape_holds_for_many_paths() {
        let paths = ["/", "/a", "/a/", "/a/b", "/a//b/", "/x/y/z/w/", "/file.txt"];
        for p in paths {
            let chain = ancestry_of(p, true);
            assert!(!chain.is_empty(), "{p}");
            assert_eq!(chain.first().map(String::as_str), Some("/"), "{p}");
            assert_eq!(chain.last().cloned(), Some(normalized(p)), "{p}");
            assert_eq!(chain.len(), depth(p), "{p}");
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth("/a/"), 2);
        assert_eq!(depth("/a/b/c/"), 4);
        assert_eq!(depth("/a/b/c"), 4);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/a/b/").as_deref(), Some("/a/"));
        assert_eq!(parent_path("/a/").as_deref(), Some("/"));
    }

    #[test]
    fn test_is_descendant_path() {
        assert!(is_descendant_path("/a/b/", "/a/"));
        assert!(is_descendant_path("/a/b/", "/"));
        assert!(is_descendant_path("/a/b", "/a"));
        assert!(!is_descendant_path("/a/", "/a/"));
        assert!(!is_descendant_path("/ab/", "/a"));
        assert!(!is_descendant_path("/a/", "/a/b/"));
    }

    #[test]
    fn test_is_sibling_path() {
        assert!(is_sibling_path("/a/b/", "/a/c/"));
        assert!(is_sibling_path("/a/", "/b/"));
        assert!(!is_sibling_path("/a/b/", "/x/c/"));
        assert!(!is_sibling_path("/a/", "/a/b/"));
        assert!(!is_sibling_path("/", "/"));
        assert!(!is_sibling_path("/a/b/", "/a/b/"));
        assert!(!is_sibling_path("/a/b", "/a/b/"));
        for (a, b) in [("/a/b/", "/a/c/"), ("/a/", "/a/b/"), ("/p/", "/q/")] {
            assert_eq!(is_sibling_path(a, b), is_sibling_path(b, a));
        }
    }
}
