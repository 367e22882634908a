//! Request identity from a JWT bearer token.

use axum::http::HeaderMap;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use urlgate_core::{Identity, IdentitySource};

/// Role that marks a staff account.
pub const STAFF_ROLE: &str = "staff";

/// Role that marks a superuser.
pub const ROOT_ROLE_ID: &str = "auth:root";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        let has = |role: &str| c.roles.iter().any(|r| r == role);
        let (is_staff, is_superuser) = (has(STAFF_ROLE), has(ROOT_ROLE_ID));
        Identity {
            user_id: Some(c.sub),
            groups: c.groups,
            is_staff,
            is_superuser,
        }
    }
}

/// Reads `Authorization: Bearer <token>`. A missing or invalid token is
/// an anonymous request.
pub struct JwtIdentity {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl IdentitySource for JwtIdentity {
    fn identify(&self, headers: &HeaderMap) -> Identity {
        let Some(token) = extract_bearer(headers) else {
            return Identity::anonymous();
        };
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims.into(),
            Err(e) => {
                debug!(error = %e, "ignoring invalid bearer token");
                Identity::anonymous()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header};

    pub fn token(secret: &str, sub: &str, roles: &[&str], groups: &[&str]) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            exp: 4_102_444_800, // 2100-01-01
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_valid_token() {
        let source = JwtIdentity::new("secret");
        let id = source.identify(&bearer(&token("secret", "alice", &[STAFF_ROLE], &["editors"])));
        assert_eq!(id.user_id.as_deref(), Some("alice"));
        assert!(id.is_staff);
        assert!(!id.is_superuser);
        assert_eq!(id.groups, vec!["editors"]);

        let root = source.identify(&bearer(&token("secret", "root", &[ROOT_ROLE_ID], &[])));
        assert!(root.is_superuser);
    }

    #[test]
    fn test_missing_or_bad_token_is_anonymous() {
        let source = JwtIdentity::new("secret");
        assert_eq!(source.identify(&HeaderMap::new()), Identity::anonymous());
        assert_eq!(
            source.identify(&bearer(&token("other-secret", "alice", &[], &[]))),
            Identity::anonymous()
        );
        assert_eq!(source.identify(&bearer("garbage")), Identity::anonymous());
    }
}
