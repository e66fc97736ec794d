use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::api::error::ApiError;
use crate::auth::{bearer_token, AuthError, TokenVerifier};
use crate::model::CurrentUser;

/// Axum extractor for the authenticated caller.
///
/// Reads `Authorization: Bearer <token>` and verifies it with the
/// [`TokenVerifier`] held in the router state. Missing or invalid tokens
/// are rejected with 401.
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    TokenVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers).ok_or(AuthError::MissingToken)?;
        let verifier = TokenVerifier::from_ref(state);

        Ok(verifier.verify(token)?)
    }
}

/// Bearer token from the request headers
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, StatusCode};
    use chrono::Duration;

    #[derive(Clone)]
    struct TestState {
        tokens: TokenVerifier,
    }

    impl FromRef<TestState> for TokenVerifier {
        fn from_ref(state: &TestState) -> Self {
            state.tokens.clone()
        }
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut request = Request::builder().uri("/api/family-trees");
        if let Some(header) = header {
            request = request.header(AUTHORIZATION, header);
        }
        request.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_current_user_extraction() {
        let state = TestState {
            tokens: TokenVerifier::new("extractor-secret"),
        };
        let user = CurrentUser {
            id: "user-123".to_string(),
            email: "test@example.com".to_string(),
        };
        let token = state.tokens.issue(&user, Duration::minutes(5)).unwrap();

        let mut parts = parts_with(Some(&format!("Bearer {}", token)));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let state = TestState {
            tokens: TokenVerifier::new("extractor-secret"),
        };

        let mut parts = parts_with(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with(Some("Bearer not-a-jwt"));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }
}
