use urlgate_core::{ListParams, ListResult, new_id, now_rfc3339};
use urlgate_sql::{Row, Value, placeholders};

use crate::model::{Aspects, CreateUrl, UpdateUrl, UrlNode};
use crate::path;
use crate::registry::AspectKind;
use crate::service::{UrlError, UrlService};

pub(crate) const URL_COLUMNS: &str = "id, site, path, depth, created_at, modified_at";

/// Build a UrlNode from a row selected with [`URL_COLUMNS`].
pub(crate) fn url_from_row(row: &Row) -> Result<UrlNode, UrlError> {
    let text = |name: &str| {
        row.get_str(name)
            .map(str::to_string)
            .ok_or_else(|| UrlError::Internal(format!("missing {} column", name)))
    };
    let depth = row
        .get_i64("depth")
        .ok_or_else(|| UrlError::Internal("missing depth column".into()))?;
    Ok(UrlNode {
        id: text("id")?,
        site: text("site")?,
        path: text("path")?,
        depth: depth as usize,
        created_at: text("created_at")?,
        modified_at: text("modified_at")?,
        aspects: Aspects::default(),
    })
}

impl UrlService {
    pub(crate) fn query_urls(&self, sql: &str, params: &[Value]) -> Result<Vec<UrlNode>, UrlError> {
        let rows = self.sql.query(sql, params)?;
        rows.iter().map(url_from_row).collect()
    }

    fn count(&self, sql: &str, params: &[Value]) -> Result<usize, UrlError> {
        let rows = self.sql.query(sql, params)?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }

    /// Create a URL node. The path is trimmed and validated first.
    pub fn create_url(&self, input: CreateUrl) -> Result<UrlNode, UrlError> {
        let path = path::validate_path(&input.path)?;
        let site = input.site.unwrap_or_else(|| self.current_site.clone());
        let now = now_rfc3339();

        let node = UrlNode {
            id: new_id(),
            site,
            depth: path::depth(&path),
            path,
            created_at: now.clone(),
            modified_at: now,
            aspects: Aspects::default(),
        };

        self.sql
            .exec(
                "INSERT INTO urls (id, site, path, depth, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(node.id.clone()),
                    Value::Text(node.site.clone()),
                    Value::Text(node.path.clone()),
                    Value::Integer(node.depth as i64),
                    Value::Text(node.created_at.clone()),
                    Value::Text(node.modified_at.clone()),
                ],
            )
            .map_err(|e| match UrlError::from(e) {
                UrlError::Conflict(_) => UrlError::Conflict(format!(
                    "url '{}' already exists on site '{}'",
                    node.path, node.site
                )),
                other => other,
            })?;

        Ok(node)
    }

    /// Get a URL node by id.
    pub fn get_url(&self, id: &str) -> Result<UrlNode, UrlError> {
        let sql = format!("SELECT {} FROM urls WHERE id = ?1", URL_COLUMNS);
        self.query_urls(&sql, &[Value::Text(id.to_string())])?
            .into_iter()
            .next()
            .ok_or_else(|| UrlError::NotFound(format!("urls/{}", id)))
    }

    /// Exact path lookup on a site.
    pub fn find_by_path(&self, site: &str, path: &str) -> Result<Option<UrlNode>, UrlError> {
        let sql = format!("SELECT {} FROM urls WHERE site = ?1 AND path = ?2", URL_COLUMNS);
        Ok(self
            .query_urls(&sql, &[Value::from(site), Value::from(path)])?
            .into_iter()
            .next())
    }

    /// Change a node's path.
    pub fn update_url(&self, id: &str, input: UpdateUrl) -> Result<UrlNode, UrlError> {
        let mut node = self.get_url(id)?;
        node.path = path::validate_path(&input.path)?;
        node.depth = path::depth(&node.path);
        node.modified_at = now_rfc3339();

        let affected = self
            .sql
            .exec(
                "UPDATE urls SET path = ?1, depth = ?2, modified_at = ?3 WHERE id = ?4",
                &[
                    Value::Text(node.path.clone()),
                    Value::Integer(node.depth as i64),
                    Value::Text(node.modified_at.clone()),
                    Value::Text(id.to_string()),
                ],
            )
            .map_err(|e| match UrlError::from(e) {
                UrlError::Conflict(_) => UrlError::Conflict(format!(
                    "url '{}' already exists on site '{}'",
                    node.path, node.site
                )),
                other => other,
            })?;

        if affected == 0 {
            return Err(UrlError::NotFound(format!("urls/{}", id)));
        }
        Ok(node)
    }

    /// Delete a node. Attached aspects go with it.
    pub fn delete_url(&self, id: &str) -> Result<(), UrlError> {
        let affected = self
            .sql
            .exec("DELETE FROM urls WHERE id = ?1", &[Value::Text(id.to_string())])?;
        if affected == 0 {
            return Err(UrlError::NotFound(format!("urls/{}", id)));
        }
        Ok(())
    }

    /// List a site's URLs, most recently modified first.
    ///
    /// `params.q` is a case-insensitive path prefix; `filters` are the
    /// admin list filters of mounted aspects, each with a yes/no choice.
    pub fn list_urls(
        &self,
        site: &str,
        params: &ListParams,
        filters: &[(AspectKind, bool)],
    ) -> Result<ListResult<UrlNode>, UrlError> {
        let mut where_clauses = vec!["site = ?1".to_string()];
        let mut sql_params = vec![Value::from(site)];

        if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            sql_params.push(Value::from(q));
            let idx = sql_params.len();
            where_clauses.push(format!(
                "lower(substr(path, 1, length(?{idx}))) = lower(?{idx})"
            ));
        }

        for (kind, yes) in filters {
            where_clauses.push(kind.filter().clause(*yes));
        }

        let where_sql = where_clauses.join(" AND ");
        let total = self.count(
            &format!("SELECT COUNT(*) AS cnt FROM urls WHERE {}", where_sql),
            &sql_params,
        )?;

        let limit_idx = sql_params.len() + 1;
        let offset_idx = sql_params.len() + 2;
        sql_params.push(Value::Integer(params.limit as i64));
        sql_params.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT {} FROM urls WHERE {} ORDER BY modified_at DESC, path DESC LIMIT ?{} OFFSET ?{}",
            URL_COLUMNS, where_sql, limit_idx, offset_idx,
        );
        let items = self.query_urls(&sql, &sql_params)?;

        Ok(ListResult { items, total })
    }

    /// Bulk lookup of a site's nodes whose path is one of `paths`,
    /// deepest first.
    pub fn nodes_for_paths(&self, site: &str, paths: &[String]) -> Result<Vec<UrlNode>, UrlError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM urls WHERE site = ?1 AND path IN ({}) ORDER BY depth DESC, path DESC",
            URL_COLUMNS,
            placeholders(2, paths.len()),
        );
        let mut params = Vec::with_capacity(paths.len() + 1);
        params.push(Value::from(site));
        params.extend(paths.iter().map(|p| Value::Text(p.clone())));
        self.query_urls(&sql, &params)
    }

    /// Case-insensitive exact match for a request path.
    pub fn perfect_match(&self, site: &str, path: &str) -> Result<Option<UrlNode>, UrlError> {
        let sql = format!(
            "SELECT {} FROM urls WHERE site = ?1 AND path = ?2 COLLATE NOCASE LIMIT 1",
            URL_COLUMNS
        );
        Ok(self
            .query_urls(&sql, &[Value::from(site), Value::from(path.trim())])?
            .into_iter()
            .next())
    }

    /// The deepest stored node that is the request path or one of its
    /// ancestors.
    pub fn imperfect_match(&self, site: &str, path: &str) -> Result<Option<UrlNode>, UrlError> {
        let paths = crate::resolver::lookup_paths(path)?;
        Ok(self.nodes_for_paths(site, &paths)?.into_iter().next())
    }

    // ── Tree queries ──

    /// Stored ancestors of `node`, nearest first.
    pub fn get_ancestors(&self, node: &UrlNode, include_self: bool) -> Result<Vec<UrlNode>, UrlError> {
        if node.is_root() {
            if include_self {
                return self.get_root_nodes(&node.site);
            }
            return Ok(Vec::new());
        }
        let mut paths = node.path_ancestry(include_self);
        if include_self && !paths.contains(&node.path) {
            paths.push(node.path.clone());
        }
        self.nodes_for_paths(&node.site, &paths)
    }

    pub fn get_ancestor_count(&self, node: &UrlNode) -> Result<usize, UrlError> {
        Ok(self.get_ancestors(node, false)?.len())
    }

    /// The node stored at the immediate parent path, if any.
    pub fn get_parent(&self, node: &UrlNode) -> Result<Option<UrlNode>, UrlError> {
        match path::parent_path(&node.path) {
            Some(parent) => self.find_by_path(&node.site, &parent),
            None => Ok(None),
        }
    }

    fn below_clause(node: &UrlNode) -> (String, Vec<Value>) {
        (
            "site = ?1 AND substr(path, 1, length(?2)) = ?2 AND id != ?3".to_string(),
            vec![
                Value::Text(node.site.clone()),
                Value::Text(path::normalized(&node.path)),
                Value::Text(node.id.clone()),
            ],
        )
    }

    pub fn get_descendants(&self, node: &UrlNode) -> Result<Vec<UrlNode>, UrlError> {
        let (clause, params) = Self::below_clause(node);
        let sql = format!("SELECT {} FROM urls WHERE {} ORDER BY path", URL_COLUMNS, clause);
        self.query_urls(&sql, &params)
    }

    pub fn get_descendant_count(&self, node: &UrlNode) -> Result<usize, UrlError> {
        let (clause, params) = Self::below_clause(node);
        self.count(&format!("SELECT COUNT(*) AS cnt FROM urls WHERE {}", clause), &params)
    }

    /// Direct children: below `node` and exactly one level deeper.
    pub fn get_children(&self, node: &UrlNode) -> Result<Vec<UrlNode>, UrlError> {
        let (clause, mut params) = Self::below_clause(node);
        params.push(Value::Integer(node.depth as i64 + 1));
        let sql = format!(
            "SELECT {} FROM urls WHERE {} AND depth = ?4 ORDER BY path",
            URL_COLUMNS, clause
        );
        self.query_urls(&sql, &params)
    }

    pub fn get_children_count(&self, node: &UrlNode) -> Result<usize, UrlError> {
        let (clause, mut params) = Self::below_clause(node);
        params.push(Value::Integer(node.depth as i64 + 1));
        self.count(
            &format!("SELECT COUNT(*) AS cnt FROM urls WHERE {} AND depth = ?4", clause),
            &params,
        )
    }

    /// Other nodes at the same depth under the same parent path.
    pub fn get_siblings(&self, node: &UrlNode) -> Result<Vec<UrlNode>, UrlError> {
        let Some(parent) = path::parent_path(&node.path) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT {} FROM urls
             WHERE site = ?1 AND substr(path, 1, length(?2)) = ?2 AND depth = ?3 AND id != ?4
             ORDER BY path",
            URL_COLUMNS
        );
        self.query_urls(
            &sql,
            &[
                Value::Text(node.site.clone()),
                Value::Text(parent),
                Value::Integer(node.depth as i64),
                Value::Text(node.id.clone()),
            ],
        )
    }

    pub fn get_root_nodes(&self, site: &str) -> Result<Vec<UrlNode>, UrlError> {
        let sql = format!("SELECT {} FROM urls WHERE site = ?1 AND path = ?2", URL_COLUMNS);
        self.query_urls(&sql, &[Value::from(site), Value::from(path::ROOT_PATH)])
    }

    pub fn get_root(&self, site: &str) -> Result<UrlNode, UrlError> {
        self.get_root_nodes(site)?
            .into_iter()
            .next()
            .ok_or_else(|| UrlError::NotFound(format!("root url on site '{}'", site)))
    }
}
