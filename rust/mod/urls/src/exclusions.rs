//! Paths the gate never looks at.

use regex::Regex;

use crate::config::GateSettings;
use crate::service::UrlError;

/// Fixed prefixes plus user patterns, compiled once and shared.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    pub fn new<P, R>(prefixes: P, patterns: R) -> Result<Self, UrlError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    UrlError::Validation(format!("bad exclusion pattern '{}': {}", p.as_ref(), e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { prefixes, patterns })
    }

    pub fn from_settings(settings: &GateSettings) -> Result<Self, UrlError> {
        Self::new(
            [
                settings.static_url.as_str(),
                settings.media_url.as_str(),
                settings.admin_prefix.as_str(),
            ],
            &settings.exclude,
        )
    }

    /// A prefix also covers its bare form: `/static/` excludes `/static`.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| {
            path.starts_with(p.as_str()) || {
                let bare = p.trim_end_matches('/');
                !bare.is_empty() && path == bare
            }
        }) || self.patterns.iter().any(|r| r.is_match(path))
    }
}
