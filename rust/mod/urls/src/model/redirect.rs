use serde::{Deserialize, Serialize};

use crate::service::UrlError;

/// Redirect attached 1:1 to a URL node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Absolute target: `http(s)://`, `//` or `/`-rooted.
    pub target: String,

    /// 301 when true, 302 otherwise.
    pub is_permanent: bool,
}

/// Trim and validate a redirect target.
///
/// Relative targets (`.`, `/.`, or no leading separator) are refused so a
/// redirect never depends on the path it was requested from.
pub fn validate_redirect_target(raw: &str) -> Result<String, UrlError> {
    let target = raw.trim();
    if target.is_empty() {
        return Err(UrlError::Validation("invalid redirect target".into()));
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.to_string());
    }
    if target.starts_with("//") {
        return Ok(target.to_string());
    }
    if target.starts_with('.') || target.starts_with("/.") {
        return Err(UrlError::Validation("redirect target may not be relative".into()));
    }
    if target.starts_with('/') {
        return Ok(target.to_string());
    }
    Err(UrlError::Validation("redirect target may not be relative".into()))
}

fn default_permanent() -> bool {
    true
}

/// Input for setting a URL's redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRedirect {
    pub target: String,
    #[serde(default = "default_permanent")]
    pub is_permanent: bool,
}
