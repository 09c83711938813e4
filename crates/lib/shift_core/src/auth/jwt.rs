//! JWT access token issuance and inspection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::AuthError;
use crate::models::auth::{Principal, TokenClaims};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// What an access token cookie turned out to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenState {
    /// Signature valid and not yet expired.
    Valid(TokenClaims),
    /// Signature valid but past `exp`. Claims are decoded without the expiry check.
    Expired(TokenClaims),
    /// Malformed, wrong signature, or otherwise unusable.
    Invalid,
}

/// Issues and inspects HS256 access tokens with a fixed signing secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign `{id, email, role}` with a 15 minute validity.
    pub fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_access_token_at(principal, Utc::now())
    }

    /// Like [`Self::issue_access_token`] with an explicit issue instant.
    pub fn issue_access_token_at(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            exp: (issued_at + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
            iat: issued_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Classify a token as valid, expired-but-authentic, or invalid.
    pub fn inspect(&self, token: &str) -> AccessTokenState {
        match decode::<TokenClaims>(token, &self.decoding, &strict_validation()) {
            Ok(data) => AccessTokenState::Valid(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                match decode::<TokenClaims>(token, &self.decoding, &expiry_ignored_validation()) {
                    Ok(data) => AccessTokenState::Expired(data.claims),
                    Err(_) => AccessTokenState::Invalid,
                }
            }
            Err(_) => AccessTokenState::Invalid,
        }
    }

    /// Claims of a currently valid token, if any.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        match self.inspect(token) {
            AccessTokenState::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn expiry_ignored_validation() -> Validation {
    let mut validation = strict_validation();
    validation.validate_exp = false;
    validation
}

/// Load the signing secret persisted at `path`, generating one on first use.
///
/// Used when no secret is configured explicitly so tokens survive restarts.
pub fn load_or_generate_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "could not create JWT secret directory");
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "could not persist JWT secret; sessions will not survive a restart"
        ),
    }
    secret
}

/// Default location of the persisted JWT secret.
pub fn default_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shift")
        .join("jwt-secret")
}
