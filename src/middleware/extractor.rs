use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use super::config::GateConfig;
use super::state::GateState;
use super::types::{EmptyProps, PageResponse, RedirectTarget};
use crate::cookies;

/// Pre-render check for a protected page.
///
/// Admits the request when the session cookie is present and non-empty,
/// otherwise redirects (non-permanently) to the public page. The cookie value
/// is never validated: this is a presence check, not authentication.
#[must_use]
pub fn server_side_props(jar: &CookieJar, config: &GateConfig) -> PageResponse<EmptyProps> {
    match admit(jar, config) {
        Ok(_) => PageResponse::Props(EmptyProps {}),
        Err(target) => PageResponse::Redirect(target),
    }
}

fn admit<'a>(jar: &'a CookieJar, config: &GateConfig) -> Result<&'a str, RedirectTarget> {
    cookies::session_token(jar, &config.cookie_name).ok_or_else(|| {
        tracing::debug!(cookie = %config.cookie_name, "No session cookie, redirecting");
        RedirectTarget::temporary(config.public_redirect.clone())
    })
}

/// Session cookie value of an admitted request.
///
/// Use as an Axum extractor in protected handlers. Requests without the cookie
/// are redirected to the public page.
///
/// # Example
///
/// ```rust,ignore
/// async fn account(SessionCookie(_token): SessionCookie) -> impl IntoResponse {
///     Html("<h1>Account</h1>")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionCookie(pub String);

impl<S> FromRequestParts<S> for SessionCookie
where
    GateState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RedirectTarget;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        admit(&jar, &gate.config).map(|token| Self(token.to_string()))
    }
}
