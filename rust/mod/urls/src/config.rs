use serde::Deserialize;

fn default_site() -> String {
    "default".to_string()
}

fn default_static_url() -> String {
    "/static/".to_string()
}

fn default_media_url() -> String {
    "/media/".to_string()
}

fn default_admin_prefix() -> String {
    "/admin/".to_string()
}

/// `[gate]` settings: which site to resolve against, which paths to leave
/// alone, and which aspects to mount.
#[derive(Debug, Clone, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_site")]
    pub site: String,

    #[serde(default = "default_static_url")]
    pub static_url: String,

    #[serde(default = "default_media_url")]
    pub media_url: String,

    /// Prefix the admin API is mounted under; also never gated.
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,

    /// Extra regular expressions for paths that skip the gate.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Aspect names in evaluation order. Missing or empty mounts nothing.
    #[serde(default)]
    pub aspects: Option<Vec<String>>,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            site: default_site(),
            static_url: default_static_url(),
            media_url: default_media_url(),
            admin_prefix: default_admin_prefix(),
            exclude: Vec::new(),
            aspects: None,
        }
    }
}
