//! Ghost Admin API key parsing and short-lived JWT minting.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use ghostwriter_shared::{GhostwriterError, Result};

/// Token lifetime accepted by Ghost (at most five minutes).
const TOKEN_TTL_SECS: i64 = 5 * 60;

/// Audience claim for Admin API tokens.
pub const ADMIN_AUDIENCE: &str = "/admin/";

/// Claims of an Admin API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

/// An Admin API key as issued by Ghost: `<key id>:<hex secret>`.
#[derive(Clone)]
pub struct AdminApiKey {
    id: String,
    secret: Vec<u8>,
}

impl AdminApiKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let (id, secret_hex) = raw.trim().split_once(':').ok_or_else(|| {
            GhostwriterError::config("Ghost Admin API key must have the form <id>:<secret>")
        })?;

        if id.is_empty() {
            return Err(GhostwriterError::config("Ghost Admin API key id is empty"));
        }

        let secret = hex::decode(secret_hex).map_err(|e| {
            GhostwriterError::config(format!("Ghost Admin API key secret is not hex: {e}"))
        })?;

        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sign an HS256 token valid from `now` for five minutes.
    pub fn token(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.id.clone());

        let iat = now.timestamp();
        let claims = AdminClaims {
            iat,
            exp: iat + TOKEN_TTL_SECS,
            aud: ADMIN_AUDIENCE.to_string(),
        };

        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| GhostwriterError::validation(format!("failed to sign Ghost token: {e}")))
    }
}

impl std::fmt::Debug for AdminApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
