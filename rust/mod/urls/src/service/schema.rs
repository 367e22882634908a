use urlgate_sql::SQLStore;

use crate::service::UrlError;

/// Initialize the SQLite schema for URL nodes and their aspects.
///
/// Every aspect table cascades on URL deletion.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), UrlError> {
    let statements = [
        // URL nodes: one row per stored path per site
        "CREATE TABLE IF NOT EXISTS urls (
            id TEXT PRIMARY KEY,
            site TEXT NOT NULL,
            path TEXT NOT NULL,
            depth INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            UNIQUE (site, path)
        )",
        "CREATE INDEX IF NOT EXISTS idx_urls_site_depth ON urls(site, depth)",
        "CREATE INDEX IF NOT EXISTS idx_urls_modified ON urls(modified_at)",

        // Publishing window (1:1)
        "CREATE TABLE IF NOT EXISTS url_visibility (
            url_id TEXT PRIMARY KEY,
            publish_on TEXT NOT NULL,
            unpublish_on TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (url_id) REFERENCES urls(id) ON DELETE CASCADE
        )",

        // Redirect (1:1)
        "CREATE TABLE IF NOT EXISTS url_redirect (
            url_id TEXT PRIMARY KEY,
            target TEXT NOT NULL,
            is_permanent INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (url_id) REFERENCES urls(id) ON DELETE CASCADE
        )",

        // Login / staff / superuser flags (1:1)
        "CREATE TABLE IF NOT EXISTS url_access (
            url_id TEXT PRIMARY KEY,
            requires_authenticated INTEGER NOT NULL DEFAULT 0,
            requires_staff INTEGER NOT NULL DEFAULT 0,
            requires_superuser INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (url_id) REFERENCES urls(id) ON DELETE CASCADE
        )",

        // Group restrictions (N per URL)
        "CREATE TABLE IF NOT EXISTS url_access_groups (
            url_id TEXT NOT NULL,
            group_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (url_id, group_id),
            FOREIGN KEY (url_id) REFERENCES urls(id) ON DELETE CASCADE
        )",

        // User restrictions (N per URL)
        "CREATE TABLE IF NOT EXISTS url_access_users (
            url_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (url_id, user_id),
            FOREIGN KEY (url_id) REFERENCES urls(id) ON DELETE CASCADE
        )",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| UrlError::Storage(e.to_string()))?;
    }

    Ok(())
}
