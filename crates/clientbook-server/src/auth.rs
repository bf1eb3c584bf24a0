//! Bearer token verification for write routes.
//!
//! Tokens are HS256 JWTs signed with `auth.jwt_secret`; only the signature
//! and `exp` are checked. Issuing tokens happens elsewhere.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Cookie carrying the token for cookie-based login flows.
pub const TOKEN_COOKIE: &str = "token";

/// Claims read from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject; login flows put the numeric user id here.
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<TokenData<Claims>, TokenError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?)
    }
}

/// Middleware state; `None` leaves write routes open.
#[derive(Clone, Default)]
pub struct AuthState {
    verifier: Option<Arc<JwtVerifier>>,
}

impl AuthState {
    pub fn from_config(cfg: &AuthConfig) -> Self {
        if cfg.enabled {
            Self::with_secret(&cfg.jwt_secret)
        } else {
            Self::disabled()
        }
    }

    pub fn with_secret(secret: &str) -> Self {
        Self {
            verifier: Some(Arc::new(JwtVerifier::new(secret))),
        }
    }

    pub fn disabled() -> Self {
        Self { verifier: None }
    }

    pub fn verifier(&self) -> Option<&JwtVerifier> {
        self.verifier.as_deref()
    }
}
