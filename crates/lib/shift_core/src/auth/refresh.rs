//! Opaque random tokens: refresh credentials and one-shot action tokens.

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};

/// Refresh token lifetime: 30 days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Action token (verification / password reset) lifetime: 15 minutes.
pub const ACTION_TOKEN_TTL_MINUTES: i64 = 15;

const REFRESH_TOKEN_LEN: usize = 64;
const ACTION_TOKEN_LEN: usize = 21;

/// A freshly minted opaque token and when it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn random_token(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a cryptographically random refresh token valid for 30 days.
pub fn issue_refresh_token(now: DateTime<Utc>) -> IssuedToken {
    IssuedToken {
        token: random_token(REFRESH_TOKEN_LEN),
        expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
    }
}

/// Generate an email action token valid for 15 minutes.
pub fn issue_action_token(now: DateTime<Utc>) -> IssuedToken {
    IssuedToken {
        token: random_token(ACTION_TOKEN_LEN),
        expires_at: now + Duration::minutes(ACTION_TOKEN_TTL_MINUTES),
    }
}

/// SHA-256 hash a refresh token for storage and lookup.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
