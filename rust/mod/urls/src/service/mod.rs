pub mod schema;
pub mod url;
pub mod aspects;

use std::sync::Arc;

use thiserror::Error;

use urlgate_sql::{SQLError, SQLStore};

/// URL service error type.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for UrlError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::Constraint(m) => UrlError::Conflict(m),
            other => UrlError::Storage(other.to_string()),
        }
    }
}

impl From<UrlError> for urlgate_core::ServiceError {
    fn from(e: UrlError) -> Self {
        match e {
            UrlError::NotFound(m) => urlgate_core::ServiceError::NotFound(m),
            UrlError::Conflict(m) => urlgate_core::ServiceError::Conflict(m),
            UrlError::Validation(m) => urlgate_core::ServiceError::Validation(m),
            UrlError::Storage(m) => urlgate_core::ServiceError::Storage(m),
            UrlError::Internal(m) => urlgate_core::ServiceError::Internal(m),
        }
    }
}

/// The URL store. Owns the SQL backend and the site new URLs default to.
pub struct UrlService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) current_site: String,
}

impl UrlService {
    /// Create a new UrlService, initializing the DB schema.
    pub fn new(sql: Arc<dyn SQLStore>, current_site: &str) -> Result<Arc<Self>, UrlError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            current_site: current_site.to_string(),
        }))
    }

    /// Site used when a caller does not name one.
    pub fn current_site(&self) -> &str {
        &self.current_site
    }
}
