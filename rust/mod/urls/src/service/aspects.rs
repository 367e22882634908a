use std::collections::HashMap;

use chrono::{DateTime, Utc};
use urlgate_core::{format_timestamp, now_rfc3339, parse_timestamp};
use urlgate_sql::{Row, Value, placeholders};

use crate::model::{
    AddGroupRestriction, AddUserRestriction, Redirect, SetRedirect, SetVisibility, SimpleAccess,
    UrlNode, Visibility, validate_redirect_target,
};
use crate::registry::AspectKind;
use crate::service::url::URL_COLUMNS;
use crate::service::{UrlError, UrlService};

fn time_column(row: &Row, name: &str) -> Result<Option<DateTime<Utc>>, UrlError> {
    match row.get_str(name) {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| UrlError::Internal(format!("bad timestamp in {}: {}", name, s))),
    }
}

fn visibility_from_row(row: &Row) -> Result<Visibility, UrlError> {
    Ok(Visibility {
        publish_on: time_column(row, "publish_on")?
            .ok_or_else(|| UrlError::Internal("missing publish_on column".into()))?,
        unpublish_on: time_column(row, "unpublish_on")?,
    })
}

fn redirect_from_row(row: &Row) -> Redirect {
    Redirect {
        target: row.get_str("target").unwrap_or_default().to_string(),
        is_permanent: row.get_bool("is_permanent"),
    }
}

fn access_from_row(row: &Row) -> SimpleAccess {
    SimpleAccess {
        requires_authenticated: row.get_bool("requires_authenticated"),
        requires_staff: row.get_bool("requires_staff"),
        requires_superuser: row.get_bool("requires_superuser"),
    }
}

impl UrlService {
    fn ensure_url(&self, url_id: &str) -> Result<(), UrlError> {
        self.get_url(url_id).map(|_| ())
    }

    fn one_row(&self, sql: &str, url_id: &str) -> Result<Option<Row>, UrlError> {
        Ok(self
            .sql
            .query(sql, &[Value::Text(url_id.to_string())])?
            .into_iter()
            .next())
    }

    fn delete_aspect(&self, table: &str, url_id: &str) -> Result<(), UrlError> {
        let affected = self.sql.exec(
            &format!("DELETE FROM {} WHERE url_id = ?1", table),
            &[Value::Text(url_id.to_string())],
        )?;
        if affected == 0 {
            return Err(UrlError::NotFound(format!("urls/{}/{}", url_id, table)));
        }
        Ok(())
    }

    // ── Visibility ──

    pub fn get_visibility(&self, url_id: &str) -> Result<Option<Visibility>, UrlError> {
        self.one_row(
            "SELECT publish_on, unpublish_on FROM url_visibility WHERE url_id = ?1",
            url_id,
        )?
        .map(|row| visibility_from_row(&row))
        .transpose()
    }

    /// Upsert a window and return it as stored (microsecond precision).
    fn write_visibility(&self, url_id: &str, v: &Visibility) -> Result<Visibility, UrlError> {
        let now = now_rfc3339();
        self.sql.exec(
            "INSERT INTO url_visibility (url_id, publish_on, unpublish_on, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(url_id) DO UPDATE SET
                publish_on = excluded.publish_on,
                unpublish_on = excluded.unpublish_on,
                updated_at = excluded.updated_at",
            &[
                Value::Text(url_id.to_string()),
                Value::Text(format_timestamp(&v.publish_on)),
                Value::from(v.unpublish_on.as_ref().map(format_timestamp)),
                Value::Text(now),
            ],
        )?;
        self.get_visibility(url_id)?
            .ok_or_else(|| UrlError::NotFound(format!("urls/{}/visibility", url_id)))
    }

    /// Create or update the publishing window of a node.
    ///
    /// A new window opens at the current time unless `publish_on` is
    /// given. `published` is applied last and overrides both bounds.
    pub fn set_visibility(&self, url_id: &str, input: SetVisibility) -> Result<Visibility, UrlError> {
        self.ensure_url(url_id)?;
        let now = Utc::now();
        let mut v = self
            .get_visibility(url_id)?
            .unwrap_or_else(|| Visibility::starting(now));

        if let Some(publish_on) = input.publish_on {
            v.publish_on = publish_on;
        }
        if input.unpublish_on.is_some() {
            v.unpublish_on = input.unpublish_on;
        }
        if let Some(published) = input.published {
            v.set_published_at(published, now);
        }

        self.write_visibility(url_id, &v)
    }

    pub fn set_published(&self, url_id: &str, published: bool) -> Result<Visibility, UrlError> {
        self.set_visibility(
            url_id,
            SetVisibility {
                published: Some(published),
                ..Default::default()
            },
        )
    }

    /// Close an existing window as of one second ago.
    pub fn unpublish(&self, url_id: &str) -> Result<Visibility, UrlError> {
        let mut v = self
            .get_visibility(url_id)?
            .ok_or_else(|| UrlError::NotFound(format!("urls/{}/visibility", url_id)))?;
        v.unpublish_at(Utc::now());
        self.write_visibility(url_id, &v)
    }

    pub fn clear_visibility(&self, url_id: &str) -> Result<(), UrlError> {
        self.delete_aspect("url_visibility", url_id)
    }

    fn urls_by_window(&self, site: &str, condition: &str) -> Result<Vec<UrlNode>, UrlError> {
        let sql = format!(
            "SELECT {} FROM urls u JOIN url_visibility v ON v.url_id = u.id
             WHERE u.site = ?1 AND ({})
             ORDER BY u.path",
            URL_COLUMNS
                .split(", ")
                .map(|c| format!("u.{c} AS {c}"))
                .collect::<Vec<_>>()
                .join(", "),
            condition,
        );
        self.query_urls(&sql, &[Value::from(site), Value::Text(now_rfc3339())])
    }

    /// Nodes whose publishing window contains the current time.
    pub fn published_urls(&self, site: &str) -> Result<Vec<UrlNode>, UrlError> {
        self.urls_by_window(
            site,
            "v.publish_on <= ?2 AND (v.unpublish_on IS NULL OR v.unpublish_on >= ?2)",
        )
    }

    /// Nodes whose window has closed or not yet opened.
    pub fn unpublished_urls(&self, site: &str) -> Result<Vec<UrlNode>, UrlError> {
        self.urls_by_window(site, "v.unpublish_on <= ?2 OR v.publish_on >= ?2")
    }

    // ── Redirect ──

    pub fn get_redirect(&self, url_id: &str) -> Result<Option<Redirect>, UrlError> {
        Ok(self
            .one_row(
                "SELECT target, is_permanent FROM url_redirect WHERE url_id = ?1",
                url_id,
            )?
            .map(|row| redirect_from_row(&row)))
    }

    pub fn set_redirect(&self, url_id: &str, input: SetRedirect) -> Result<Redirect, UrlError> {
        let redirect = Redirect {
            target: validate_redirect_target(&input.target)?,
            is_permanent: input.is_permanent,
        };
        self.ensure_url(url_id)?;

        self.sql.exec(
            "INSERT INTO url_redirect (url_id, target, is_permanent, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(url_id) DO UPDATE SET
                target = excluded.target,
                is_permanent = excluded.is_permanent,
                updated_at = excluded.updated_at",
            &[
                Value::Text(url_id.to_string()),
                Value::Text(redirect.target.clone()),
                Value::from(redirect.is_permanent),
                Value::Text(now_rfc3339()),
            ],
        )?;
        Ok(redirect)
    }

    pub fn clear_redirect(&self, url_id: &str) -> Result<(), UrlError> {
        self.delete_aspect("url_redirect", url_id)
    }

    // ── Login / staff / superuser ──

    pub fn get_simple_access(&self, url_id: &str) -> Result<Option<SimpleAccess>, UrlError> {
        Ok(self
            .one_row(
                "SELECT requires_authenticated, requires_staff, requires_superuser
                 FROM url_access WHERE url_id = ?1",
                url_id,
            )?
            .map(|row| access_from_row(&row)))
    }

    pub fn set_simple_access(&self, url_id: &str, access: SimpleAccess) -> Result<SimpleAccess, UrlError> {
        self.ensure_url(url_id)?;
        self.sql.exec(
            "INSERT INTO url_access
                (url_id, requires_authenticated, requires_staff, requires_superuser, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(url_id) DO UPDATE SET
                requires_authenticated = excluded.requires_authenticated,
                requires_staff = excluded.requires_staff,
                requires_superuser = excluded.requires_superuser,
                updated_at = excluded.updated_at",
            &[
                Value::Text(url_id.to_string()),
                Value::from(access.requires_authenticated),
                Value::from(access.requires_staff),
                Value::from(access.requires_superuser),
                Value::Text(now_rfc3339()),
            ],
        )?;
        Ok(access)
    }

    pub fn clear_simple_access(&self, url_id: &str) -> Result<(), UrlError> {
        self.delete_aspect("url_access", url_id)
    }

    // ── Group / user restrictions ──

    fn list_members(&self, table: &str, column: &str, url_id: &str) -> Result<Vec<String>, UrlError> {
        let rows = self.sql.query(
            &format!("SELECT {column} FROM {table} WHERE url_id = ?1 ORDER BY {column}"),
            &[Value::Text(url_id.to_string())],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str(column).map(str::to_string))
            .collect())
    }

    fn add_member(&self, table: &str, column: &str, url_id: &str, member: &str) -> Result<(), UrlError> {
        let member = member.trim();
        if member.is_empty() {
            return Err(UrlError::Validation(format!("{} cannot be empty", column)));
        }
        self.ensure_url(url_id)?;
        self.sql.exec(
            &format!(
                "INSERT OR IGNORE INTO {table} (url_id, {column}, created_at) VALUES (?1, ?2, ?3)"
            ),
            &[
                Value::Text(url_id.to_string()),
                Value::Text(member.to_string()),
                Value::Text(now_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn remove_member(&self, table: &str, column: &str, url_id: &str, member: &str) -> Result<(), UrlError> {
        let affected = self.sql.exec(
            &format!("DELETE FROM {table} WHERE url_id = ?1 AND {column} = ?2"),
            &[Value::Text(url_id.to_string()), Value::from(member)],
        )?;
        if affected == 0 {
            return Err(UrlError::NotFound(format!("urls/{}/{}/{}", url_id, table, member)));
        }
        Ok(())
    }

    pub fn list_group_restrictions(&self, url_id: &str) -> Result<Vec<String>, UrlError> {
        self.list_members("url_access_groups", "group_id", url_id)
    }

    pub fn add_group_restriction(&self, url_id: &str, input: AddGroupRestriction) -> Result<(), UrlError> {
        self.add_member("url_access_groups", "group_id", url_id, &input.group_id)
    }

    pub fn remove_group_restriction(&self, url_id: &str, group_id: &str) -> Result<(), UrlError> {
        self.remove_member("url_access_groups", "group_id", url_id, group_id)
    }

    pub fn list_user_restrictions(&self, url_id: &str) -> Result<Vec<String>, UrlError> {
        self.list_members("url_access_users", "user_id", url_id)
    }

    pub fn add_user_restriction(&self, url_id: &str, input: AddUserRestriction) -> Result<(), UrlError> {
        self.add_member("url_access_users", "user_id", url_id, &input.user_id)
    }

    pub fn remove_user_restriction(&self, url_id: &str, user_id: &str) -> Result<(), UrlError> {
        self.remove_member("url_access_users", "user_id", url_id, user_id)
    }

    // ── Eager loading ──

    /// Attach the given aspects to `nodes`, one `url_id IN (...)` query
    /// per kind.
    pub fn load_aspects(&self, nodes: &mut [UrlNode], kinds: &[AspectKind]) -> Result<(), UrlError> {
        if nodes.is_empty() || kinds.is_empty() {
            return Ok(());
        }

        let ids: Vec<Value> = nodes.iter().map(|n| Value::Text(n.id.clone())).collect();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let in_list = placeholders(1, ids.len());

        for kind in kinds {
            let (table, columns) = match kind {
                AspectKind::Visibility => ("url_visibility", "publish_on, unpublish_on"),
                AspectKind::Redirect => ("url_redirect", "target, is_permanent"),
                AspectKind::SimpleAccess => (
                    "url_access",
                    "requires_authenticated, requires_staff, requires_superuser",
                ),
                AspectKind::GroupAccess => ("url_access_groups", "group_id"),
                AspectKind::UserAccess => ("url_access_users", "user_id"),
            };
            let sql = format!(
                "SELECT url_id, {} FROM {} WHERE url_id IN ({})",
                columns, table, in_list
            );

            for row in self.sql.query(&sql, &ids)? {
                let Some(&i) = row.get_str("url_id").and_then(|id| index.get(id)) else {
                    continue;
                };
                let aspects = &mut nodes[i].aspects;
                match kind {
                    AspectKind::Visibility => aspects.visibility = Some(visibility_from_row(&row)?),
                    AspectKind::Redirect => aspects.redirect = Some(redirect_from_row(&row)),
                    AspectKind::SimpleAccess => aspects.access = Some(access_from_row(&row)),
                    AspectKind::GroupAccess => {
                        if let Some(g) = row.get_str("group_id") {
                            aspects.access_groups.push(g.to_string());
                        }
                    }
                    AspectKind::UserAccess => {
                        if let Some(u) = row.get_str("user_id") {
                            aspects.access_users.push(u.to_string());
                        }
                    }
                }
            }
        }

        for node in nodes.iter_mut() {
            node.aspects.access_groups.sort();
            node.aspects.access_users.sort();
        }
        Ok(())
    }
}
