pub mod auth;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{Anonymous, FixedIdentity, Identity, IdentitySource};
pub use config::ServiceConfig;
pub use error::{ErrorBody, ErrorCode, GENERIC_NOT_FOUND, ServiceError};
pub use module::Module;
pub use types::{ListParams, ListResult, format_timestamp, new_id, now_rfc3339, parse_timestamp};
