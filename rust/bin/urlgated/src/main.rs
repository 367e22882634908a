//! `urlgated` serves a site behind the URL gate, with its admin API.
//!
//! Usage:
//!   urlgated -c <context-name-or-path> [--listen <addr>] [--sqlite <file>]
//!
//! The context name resolves to `/etc/urlgate/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod identity;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use config::ServerConfig;
use identity::JwtIdentity;

/// URL gate server.
#[derive(Parser, Debug)]
#[command(name = "urlgated", about = "URL gate server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// SQLite database file. Defaults to `<data_dir>/urls.sqlite`.
    #[arg(long = "sqlite")]
    sqlite: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    server_config.verify()?;

    // Initialize storage.
    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = urlgate_core::ServiceConfig {
        data_dir: Some(data_dir),
        sqlite_path: cli.sqlite.clone(),
        listen: cli.listen.clone(),
        site: server_config.gate.site.clone(),
    };

    let sql: Arc<dyn urlgate_sql::SQLStore> = Arc::new(
        urlgate_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let identity = Arc::new(JwtIdentity::new(&server_config.jwt.secret));
    let module = urls::UrlsModule::new(sql, &server_config.gate, identity)?;
    info!(
        site = %core_config.site,
        aspects = ?module.gate().registry().kinds(),
        "URL gate initialized"
    );

    let admin_mount = server_config.admin_mount();
    let app = routes::build_router(&module, admin_mount);
    info!("Admin API mounted at {}/", admin_mount);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("urlgated listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_sqlite_override() {
        let cli = Cli::try_parse_from(["urlgated", "-c", "dev", "--sqlite", "/var/db/urls.sqlite"])
            .unwrap();
        assert_eq!(cli.config, "dev");
        assert_eq!(cli.listen, "0.0.0.0:8080");
        assert_eq!(cli.sqlite, Some(PathBuf::from("/var/db/urls.sqlite")));

        let cli = Cli::try_parse_from(["urlgated", "-c", "dev"]).unwrap();
        assert_eq!(cli.sqlite, None);
    }

    #[test]
    fn test_cli_requires_config() {
        assert!(Cli::try_parse_from(["urlgated"]).is_err());
    }
}
