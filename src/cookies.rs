use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Create the session cookie carrying the identity token.
///
/// Not `HttpOnly`: the cookie is written client-side.
pub(crate) fn session_cookie(
    name: &str,
    token: &str,
    max_age: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(max_age)
        .build()
}

/// Get the session token from a jar. Empty values count as absent.
#[cfg_attr(not(feature = "middleware"), allow(dead_code))]
pub(crate) fn session_token<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(Cookie::value).filter(|v| !v.is_empty())
}
