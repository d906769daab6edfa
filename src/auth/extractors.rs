use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::tokens::{Claims, TokenError, TokenKeys, TokenKind};
use crate::error::AuthError;

/// Identity attached to a request once its access token checks out.
/// Handlers take this as an argument instead of poking at headers.
#[derive(Debug)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Unauthenticated)?;

        // Invalid and expired are told apart in the logs only; the caller
        // always sees the same rejection.
        let claims = keys.verify(TokenKind::Access, token).map_err(|e| {
            match e {
                TokenError::Expired => warn!("expired access token"),
                TokenError::Invalid(reason) => warn!(%reason, "invalid access token"),
            }
            AuthError::Unauthenticated
        })?;

        Ok(CurrentUser {
            user_id: claims.sub,
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, Request};
    use jsonwebtoken::{encode, Header};
    use time::OffsetDateTime;

    use super::*;
    use crate::config::TokenConfig;

    #[derive(Clone)]
    struct TestState {
        keys: TokenKeys,
    }

    impl FromRef<TestState> for TokenKeys {
        fn from_ref(state: &TestState) -> Self {
            state.keys.clone()
        }
    }

    fn test_state() -> TestState {
        TestState {
            keys: TokenKeys::from_config(&TokenConfig {
                access_secret: "access-secret".into(),
                refresh_secret: "refresh-secret".into(),
                reset_secret: "reset-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                access_ttl_minutes: 5,
                refresh_ttl_minutes: 60,
                reset_ttl_minutes: 10,
            }),
        }
    }

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/me");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn accepts_valid_access_token() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.keys.sign_access(user_id).unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let user = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let state = test_state();
        let mut parts = parts_with_header(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn rejects_non_bearer_scheme() {
        let state = test_state();
        let mut parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn rejects_refresh_and_reset_tokens() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        for token in [
            state.keys.sign_refresh(user_id).unwrap(),
            state.keys.sign_reset(user_id).unwrap(),
        ] {
            let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
            let err = CurrentUser::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::Unauthenticated));
        }
    }

    #[tokio::test]
    async fn rejects_expired_access_token() {
        let state = test_state();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - 120) as usize,
            exp: (now - 1) as usize,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &state.keys.access.encoding).unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }
}
