use std::sync::Arc;

use axum::extract::FromRef;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{StoreError, UserStore};
use crate::auth::repo_types::NewUser;
use crate::auth::tokens::{TokenKeys, TokenKind};
use crate::error::AuthError;
use crate::notify::ResetNotifier;
use crate::state::AppState;

/// Freshly minted access/refresh pair.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signup input, already shape-validated by the handler layer.
#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub phone_number: String,
}

/// Well-formed Argon2 digest that matches no password. The unknown-email
/// branch of signin verifies against it so both failure paths pay the same
/// hashing cost.
const PHANTOM_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Orchestrates the credential flows. Collaborators are injected so tests
/// can run against an in-memory store and a recording notifier.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: TokenKeys,
    notifier: Arc<dyn ResetNotifier>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            TokenKeys::from_ref(state),
            state.notifier.clone(),
        )
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        keys: TokenKeys,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            store,
            keys,
            notifier,
        }
    }

    /// Create the user record. No tokens are issued here; the client signs
    /// in afterwards.
    pub async fn signup(&self, input: SignUpInput) -> Result<(), AuthError> {
        let password_hash = hash_password(&input.password)?;
        let new_user = NewUser {
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            date_of_birth: input.date_of_birth,
            phone_number: input.phone_number,
        };
        match self.store.insert(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "user signed up");
                Ok(())
            }
            Err(StoreError::DuplicateEmail) => Err(AuthError::DuplicateUser),
            Err(e) => Err(AuthError::Internal(e.into())),
        }
    }

    /// Unknown email and wrong password collapse into the same error so the
    /// response never reveals which one happened.
    pub async fn signin(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;

        let user = match user {
            Some(u) => u,
            None => {
                // Burn a verify so this path costs as much as a mismatch.
                let _ = verify_password(password, PHANTOM_DIGEST);
                debug!("signin with unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash) {
            debug!(user_id = %user.id, "signin password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(user.id)?;
        info!(user_id = %user.id, "user signed in");
        Ok(pair)
    }

    /// Rotate: verify the presented token as Refresh kind and mint a whole
    /// new pair. The old refresh token keeps working until its exp; there is
    /// no revocation store to retire it early.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.keys.verify(TokenKind::Refresh, refresh_token)?;
        let pair = self.issue_pair(claims.sub)?;
        debug!(user_id = %claims.sub, "token pair rotated");
        Ok(pair)
    }

    /// Caller sees success whether or not the email exists; only a log line
    /// and the notifier call differ.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;

        let user = match user {
            Some(u) => u,
            None => {
                debug!("forgot password for unknown email");
                return Ok(());
            }
        };

        let reset_token = self.keys.sign_reset(user.id)?;
        self.notifier
            .send_password_reset(&user.email, &reset_token)
            .await?;
        info!(user_id = %user.id, "password reset token issued");
        Ok(())
    }

    /// Overwrite the stored hash for the token's subject. Nothing is
    /// mutated unless the token verifies as Reset kind.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let claims = self.keys.verify(TokenKind::Reset, reset_token)?;
        let password_hash = hash_password(new_password)?;
        match self
            .store
            .set_password_hash(claims.sub, &password_hash)
            .await
        {
            Ok(()) => {
                info!(user_id = %claims.sub, "password reset");
                Ok(())
            }
            // Token subject no longer exists; same outward failure as a bad token.
            Err(StoreError::NotFound) => Err(AuthError::TokenInvalid),
            Err(e) => Err(AuthError::Internal(e.into())),
        }
    }

    fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.keys.sign_access(user_id)?,
            refresh_token: self.keys.sign_refresh(user_id)?,
        })
    }
}
