use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// Foreign keys are always enforced, so `ON DELETE CASCADE` on aspect
/// tables removes attached rows together with their URL.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path)
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL gives concurrent readers while the admin surface writes.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// Split constraint violations out of generic failures so callers can
/// report duplicates as conflicts.
fn classify(e: rusqlite::Error, otherwise: fn(String) -> SQLError) -> SQLError {
    match &e {
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            SQLError::Constraint(e.to_string())
        }
        _ => otherwise(e.to_string()),
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    columns.push((name.clone(), row_value_at(row, i)?));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| classify(e, SQLError::Execution))?;

        Ok(affected as u64)
    }

    fn exec_batch(&self, sql: &str) -> Result<(), SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| classify(e, SQLError::Execution))
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_tables() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec_batch(
                "CREATE TABLE parent (id TEXT PRIMARY KEY, name TEXT NOT NULL UNIQUE);
                 CREATE TABLE child (
                     parent_id TEXT NOT NULL REFERENCES parent(id) ON DELETE CASCADE,
                     note TEXT
                 );",
            )
            .unwrap();
        store
    }

    #[test]
    fn test_insert_and_query() {
        let store = store_with_tables();
        store
            .exec(
                "INSERT INTO parent (id, name) VALUES (?1, ?2)",
                &["p1".into(), "first".into()],
            )
            .unwrap();
        let rows = store
            .query("SELECT id, name FROM parent WHERE id = ?1", &["p1".into()])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name"), Some("first"));
    }

    #[test]
    fn test_unique_violation_is_constraint() {
        let store = store_with_tables();
        let insert = "INSERT INTO parent (id, name) VALUES (?1, ?2)";
        store.exec(insert, &["p1".into(), "dup".into()]).unwrap();
        let err = store.exec(insert, &["p2".into(), "dup".into()]).unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)));
    }

    #[test]
    fn test_foreign_keys_cascade() {
        let store = store_with_tables();
        store
            .exec("INSERT INTO parent (id, name) VALUES ('p1', 'x')", &[])
            .unwrap();
        store
            .exec("INSERT INTO child (parent_id, note) VALUES ('p1', NULL)", &[])
            .unwrap();
        store.exec("DELETE FROM parent WHERE id = 'p1'", &[]).unwrap();
        let rows = store.query("SELECT COUNT(*) AS cnt FROM child", &[]).unwrap();
        assert_eq!(rows[0].get_i64("cnt"), Some(0));

        let orphan = store.exec(
            "INSERT INTO child (parent_id, note) VALUES ('missing', NULL)",
            &[],
        );
        assert!(matches!(orphan, Err(SQLError::Constraint(_))));
    }

    #[test]
    fn test_null_and_text_values() {
        let store = store_with_tables();
        store
            .exec("INSERT INTO parent (id, name) VALUES ('p1', 'x')", &[])
            .unwrap();
        store
            .exec(
                "INSERT INTO child (parent_id, note) VALUES (?1, ?2)",
                &["p1".into(), Value::Null],
            )
            .unwrap();
        let rows = store.query("SELECT note FROM child", &[]).unwrap();
        assert_eq!(rows[0].get("note"), Some(&Value::Null));
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("t.sqlite")).unwrap();
        store.exec_batch("CREATE TABLE t (x INTEGER)").unwrap();
        assert_eq!(store.exec("INSERT INTO t (x) VALUES (1)", &[]).unwrap(), 1);
    }
}
