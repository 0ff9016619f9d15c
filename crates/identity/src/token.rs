//! HS256 session tokens.

use chrono::{Duration, Utc};
use common::UserId;
use domain::Principal;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Shortest allowed token lifetime, in hours.
pub const MIN_TTL_HOURS: i64 = 24;

/// Longest allowed token lifetime, in hours.
pub const MAX_TTL_HOURS: i64 = 72;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub is_admin: bool,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer for the given secret and lifetime.
    ///
    /// The secret must be non-empty and the lifetime within
    /// [`MIN_TTL_HOURS`]..=[`MAX_TTL_HOURS`].
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Result<Self, AuthError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(AuthError::Config("token secret must not be empty".to_string()));
        }
        if !(MIN_TTL_HOURS..=MAX_TTL_HOURS).contains(&ttl_hours) {
            return Err(AuthError::Config(format!(
                "token lifetime must be between {MIN_TTL_HOURS} and {MAX_TTL_HOURS} hours, got {ttl_hours}"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        })
    }

    /// Issues a token for a user.
    pub fn issue(&self, user_id: UserId, is_admin: bool) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Decodes and verifies a token's signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                AuthError::InvalidToken
            })
    }

    /// Verifies a token and turns its claims into a [`Principal`].
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.decode(token)?;
        let user_id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        Ok(Principal {
            user_id,
            is_admin: claims.is_admin,
        })
    }
}
