//! Access token middleware
//!
//! Applied to the webhook routes only. Without a configured token every
//! request passes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use tracing::warn;

/// Token from `Authorization: Bearer` or the `access_token` query parameter
fn presented_token<'a>(headers: &'a HeaderMap, query: Option<&'a str>) -> Option<&'a str> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("Token "))
        });

    from_header.or_else(|| {
        query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "access_token")
            .map(|(_, value)| value)
    })
}

/// Check a request against `expected`
pub fn verify_access_token(
    expected: &str,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<(), ApiError> {
    match presented_token(headers, query) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(ApiError::Unauthorized("Invalid access token".to_string())),
        None => Err(ApiError::Unauthorized("Missing access token".to_string())),
    }
}

/// Reject webhook calls that do not carry the configured access token
pub async fn require_access_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.access_token() {
        if let Err(e) = verify_access_token(
            expected.expose_secret(),
            request.headers(),
            request.uri().query(),
        ) {
            warn!(path = %request.uri().path(), "Rejected webhook: {}", e);
            return Err(e);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn headers(authorization: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[rstest]
    #[case(Some("Bearer secret"), None)]
    #[case(Some("Token secret"), None)]
    #[case(None, Some("access_token=secret"))]
    #[case(None, Some("foo=1&access_token=secret"))]
    fn test_accepts_valid_token(#[case] authorization: Option<&str>, #[case] query: Option<&str>) {
        assert!(verify_access_token("secret", &headers(authorization), query).is_ok());
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("Bearer wrong"), None)]
    #[case(Some("secret"), None)]
    #[case(None, Some("access_token=wrong"))]
    #[case(None, Some("token=secret"))]
    fn test_rejects_missing_or_wrong_token(
        #[case] authorization: Option<&str>,
        #[case] query: Option<&str>,
    ) {
        let result = verify_access_token("secret", &headers(authorization), query);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
