//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/urlgate"
//!
//! [jwt]
//! secret = "..."
//!
//! [gate]
//! site = "main"
//! exclude = ["^/health$"]
//! aspects = ["redirect", "visibility", "access", "access_groups", "access_users"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use urls::GateSettings;

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/urlgate";

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub gate: GateSettings,
}

impl ServerConfig {
    /// A name containing `/` or `.` is a path; anything else is a
    /// context name under `/etc/urlgate/<name>.toml`.
    pub fn resolve_path(name: &str) -> PathBuf {
        if name.contains('/') || name.contains('.') {
            PathBuf::from(name)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Refuse to start on a configuration that cannot work.
    pub fn verify(&self) -> anyhow::Result<()> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("JWT secret is empty in configuration.");
        }
        if self.storage.data_dir.is_empty() {
            anyhow::bail!("Storage data_dir is empty in configuration.");
        }
        if !self.gate.admin_prefix.starts_with('/') || self.admin_mount().is_empty() {
            anyhow::bail!(
                "gate.admin_prefix must be a non-root path starting with '/', got '{}'",
                self.gate.admin_prefix
            );
        }
        Ok(())
    }

    /// Admin prefix without its trailing separator, as `Router::nest` wants it.
    pub fn admin_mount(&self) -> &str {
        self.gate.admin_prefix.trim_end_matches('/')
    }
}
