use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, PublicUser, RefreshRequest, ResetPasswordQuery,
            ResetPasswordRequest, SignInRequest, SignUpRequest,
        },
        extractors::CurrentUser,
        service::{AuthService, SignUpInput, TokenPair},
    },
    error::AuthError,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<ApiResponse<Value>, AuthError> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!("signup with invalid email");
        return Err(AuthError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("signup password too short");
        return Err(AuthError::Validation("Password too short".into()));
    }
    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
        ("date_of_birth", &payload.date_of_birth),
        ("phone_number", &payload.phone_number),
    ] {
        if value.trim().is_empty() {
            return Err(AuthError::Validation(format!("Missing {field}")));
        }
    }

    let service = AuthService::from_ref(&state);
    service
        .signup(SignUpInput {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            date_of_birth: payload.date_of_birth,
            phone_number: payload.phone_number,
        })
        .await?;

    Ok(ApiResponse::created("SignUp success", json!({})))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(mut payload): Json<SignInRequest>,
) -> Result<ApiResponse<TokenPair>, AuthError> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!("signin with invalid email");
        return Err(AuthError::Validation("Invalid email".into()));
    }

    let service = AuthService::from_ref(&state);
    let pair = service.signin(&payload.email, &payload.password).await?;

    Ok(ApiResponse::ok("SignIn success", pair))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<ApiResponse<TokenPair>, AuthError> {
    let service = AuthService::from_ref(&state);
    let pair = service.refresh_token(&payload.refresh_token).await?;

    Ok(ApiResponse::ok("Refresh and Access Token generated", pair))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse<Value>, AuthError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::Validation("Invalid email".into()))?;

    let service = AuthService::from_ref(&state);
    service.forgot_password(email).await?;

    Ok(ApiResponse::ok("Forgot password email sent", json!({})))
}

#[instrument(skip(state, query, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordQuery>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<Value>, AuthError> {
    let token = query
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::Validation("Invalid token".into()))?;
    let new_password = payload
        .new_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AuthError::Validation("Invalid new password".into()))?;
    if new_password.len() < 8 {
        return Err(AuthError::Validation("Password too short".into()));
    }

    let service = AuthService::from_ref(&state);
    service.reset_password(token, new_password).await?;

    Ok(ApiResponse::ok("Reset password success", json!({})))
}

#[instrument(skip(state, user))]
pub async fn get_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResponse<PublicUser>, AuthError> {
    debug!(user_id = %user.user_id, token_iat = user.claims.iat, "profile request");
    let record = state
        .store
        .find_by_id(user.user_id)
        .await
        .map_err(|e| AuthError::Internal(e.into()))?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(ApiResponse::ok("OK", PublicUser::from(record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn email_regex_rejects_junk() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("nodot@example"));
    }

    #[test]
    fn public_user_serialization_hides_nothing_sensitive() {
        let public = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            verified: false,
        };
        let json = serde_json::to_string(&public).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
