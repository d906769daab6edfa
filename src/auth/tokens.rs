use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::TokenConfig, state::AppState};

/// Purpose marker carried inside every token. Verification checks it on
/// top of the per-kind secret, so a token never crosses purposes even when
/// two secrets are configured to the same value.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

/// JWT payload shared by the three token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // purpose marker
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Signing/verification key pair for one token kind.
#[derive(Clone)]
pub struct KindKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl KindKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Keys and lifetimes for all token kinds, built from config once and
/// cloned into handlers via `FromRef`.
#[derive(Clone)]
pub struct TokenKeys {
    pub access: KindKeys,
    pub refresh: KindKeys,
    pub reset: KindKeys,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.tokens)
    }
}

impl TokenKeys {
    pub fn from_config(config: &TokenConfig) -> Self {
        let minutes = |m: i64| Duration::from_secs((m as u64) * 60);
        Self {
            access: KindKeys::from_secret(&config.access_secret),
            refresh: KindKeys::from_secret(&config.refresh_secret),
            reset: KindKeys::from_secret(&config.reset_secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: minutes(config.access_ttl_minutes),
            refresh_ttl: minutes(config.refresh_ttl_minutes),
            reset_ttl: minutes(config.reset_ttl_minutes),
        }
    }

    fn keys_for(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::Reset => &self.reset,
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Reset => self.reset_ttl,
        }
    }

    pub fn sign(&self, kind: TokenKind, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl_for(kind).as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.keys_for(kind).encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "token signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(TokenKind::Access, user_id)
    }
    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(TokenKind::Refresh, user_id)
    }
    pub fn sign_reset(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(TokenKind::Reset, user_id)
    }

    /// Decode and verify a token as the requested kind. Zero leeway so a
    /// token whose exp has passed is rejected immediately.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.keys_for(kind).decoding, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        if data.claims.kind != kind {
            return Err(TokenError::Invalid("token kind mismatch".into()));
        }
        debug!(user_id = %data.claims.sub, kind = ?kind, "token verified");
        Ok(data.claims)
    }
}
