use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::errors::SyncError;
use crate::repositories::identity::{AuthUser, IdentityProvider};

/// Fixed identity, for tests and tooling.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    user: Option<AuthUser>,
}

impl StaticIdentity {
    pub fn new(user: AuthUser) -> Self {
        StaticIdentity { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        StaticIdentity { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}

/// Identity decoded from an ID token issued by the external auth
/// service. The token was already verified by that service when the
/// session was established, so only the claims are read here; expiry is
/// still honored, flipping `current_user` to `None` once the session
/// token lapses.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    user: AuthUser,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    exp: i64,
}

impl TokenIdentity {
    pub fn from_id_token(token: &str) -> Result<Self, SyncError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = vec![Algorithm::RS256, Algorithm::ES256, Algorithm::HS256];
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        let data = decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| SyncError::InternalError(format!("Invalid ID token: {e}")))?;
        let claims = data.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| SyncError::InternalError("ID token exp out of range".to_string()))?;

        Ok(TokenIdentity {
            user: AuthUser {
                uid: claims.sub,
                display_name: claims.name,
                email: claims.email,
                photo_url: claims.picture,
            },
            expires_at,
        })
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl IdentityProvider for TokenIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        if Utc::now() >= self.expires_at {
            return None;
        }
        Some(self.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        name: String,
        email: String,
        exp: i64,
    }

    fn token(exp: i64) -> String {
        let claims = TestClaims {
            sub: "uid-42".to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_claims_into_auth_user() {
        let identity = TokenIdentity::from_id_token(&token(4_102_444_800)).unwrap();
        let user = identity.current_user().unwrap();
        assert_eq!(user.uid, "uid-42");
        assert_eq!(user.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(user.email.as_deref(), Some("jane@example.com"));
        assert_eq!(user.photo_url, None);
    }

    #[test]
    fn expired_token_yields_no_user() {
        let identity = TokenIdentity::from_id_token(&token(1_000_000_000)).unwrap();
        assert!(identity.current_user().is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(TokenIdentity::from_id_token("not-a-token").is_err());
    }
}
