//! Authentication middleware
//!
//! Bearer-token extractors. Handlers that need a signed-in caller take
//! [`AuthUser`]; public handlers that behave differently for admins take
//! `Option<AuthUser>`.

use std::ops::Deref;

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

use crate::services::auth::{AuthContext, AuthService};
use crate::utils::errors::{AscesaError, Result};

/// Caller identified by a valid bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub AuthContext);

impl Deref for AuthUser {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but not a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || AscesaError::Authentication("Malformed authorization header".to_string());
    let value = value.to_str().map_err(|_| malformed())?;

    let (scheme, token) = value.trim().split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }

    Ok(Some(token))
}

fn authenticate(headers: &HeaderMap, auth: &AuthService) -> Result<Option<AuthUser>> {
    match bearer_token(headers)? {
        None => Ok(None),
        Some(token) => {
            let claims = auth.verify_token(token)?;
            debug!(user_id = claims.sub, "Request authenticated");
            Ok(Some(AuthUser(claims.into())))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AscesaError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth = AuthService::from_ref(state);
        authenticate(&parts.headers, &auth)?
            .ok_or_else(|| AscesaError::Authentication("Authentication required".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AuthService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AscesaError;

    /// A missing header is anonymous access; a bad token is still rejected
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>> {
        let auth = AuthService::from_ref(state);
        authenticate(&parts.headers, &auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer  abc.def ")).unwrap(), Some("abc.def"));
    }

    #[test]
    fn test_malformed_authorization_rejected() {
        assert_matches!(bearer_token(&headers("Basic dXNlcjpwYXNz")), Err(AscesaError::Authentication(_)));
        assert_matches!(bearer_token(&headers("Bearer")), Err(AscesaError::Authentication(_)));
        assert_matches!(bearer_token(&headers("Bearer ")), Err(AscesaError::Authentication(_)));
    }
}
