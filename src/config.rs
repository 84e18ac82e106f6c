use time::Duration;
use url::Url;

use crate::error::Error;

/// Cookie name shared by the session context (writer) and the page gate (reader).
pub const SESSION_COOKIE_NAME: &str = "next-firebase.token";

/// Lifetime of the session cookie.
pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::seconds(3600);

/// Client-side session settings.
///
/// Use [`from_env()`](SessionConfig::from_env) for convention-based setup,
/// or [`SessionConfig::default()`] with `with_*` methods for full control.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SessionConfig {
    pub(crate) cookie_name: String,
    pub(crate) cookie_max_age: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) sign_in_redirect: String,
    pub(crate) probe_url: Option<Url>,
    pub(crate) clear_cookie_on_sign_out: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.into(),
            cookie_max_age: SESSION_COOKIE_MAX_AGE,
            secure_cookies: true,
            sign_in_redirect: "/dashboard".into(),
            probe_url: None,
            clear_cookie_on_sign_out: true,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables. Every variable is optional.
    ///
    /// - `SESSION_COOKIE_NAME`: Override the session cookie name
    /// - `SESSION_COOKIE_MAX_AGE`: Cookie lifetime in seconds
    /// - `SIGN_IN_REDIRECT`: Path returned to the caller after sign-in
    /// - `SESSION_PROBE_URL`: URL fetched (and only logged) after sign-in
    /// - `COOKIE_SECURE`: `"0"` or `"false"` to drop the `Secure` attribute
    /// - `CLEAR_COOKIE_ON_SIGN_OUT`: `"0"` or `"false"` to keep the cookie on sign-out
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric or URL variable cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_cookie_name(name);
        }
        if let Ok(secs) = std::env::var("SESSION_COOKIE_MAX_AGE") {
            let secs: i64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("SESSION_COOKIE_MAX_AGE: {e}")))?;
            config = config.with_cookie_max_age(Duration::seconds(secs));
        }
        if let Ok(path) = std::env::var("SIGN_IN_REDIRECT") {
            config = config.with_sign_in_redirect(path);
        }
        if let Ok(url_str) = std::env::var("SESSION_PROBE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("SESSION_PROBE_URL: {e}")))?;
            config = config.with_probe_url(url);
        }
        if let Some(secure) = env_flag("COOKIE_SECURE") {
            config = config.with_secure_cookies(secure);
        }
        if let Some(clear) = env_flag("CLEAR_COOKIE_ON_SIGN_OUT") {
            config = config.with_clear_cookie_on_sign_out(clear);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_cookie_max_age(mut self, max_age: Duration) -> Self {
        self.cookie_max_age = max_age;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_sign_in_redirect(mut self, path: impl Into<String>) -> Self {
        self.sign_in_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_probe_url(mut self, url: Url) -> Self {
        self.probe_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_clear_cookie_on_sign_out(mut self, clear: bool) -> Self {
        self.clear_cookie_on_sign_out = clear;
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn cookie_max_age(&self) -> Duration {
        self.cookie_max_age
    }

    #[must_use]
    pub fn sign_in_redirect(&self) -> &str {
        &self.sign_in_redirect
    }

    #[must_use]
    pub fn probe_url(&self) -> Option<&Url> {
        self.probe_url.as_ref()
    }

    #[must_use]
    pub fn clear_cookie_on_sign_out(&self) -> bool {
        self.clear_cookie_on_sign_out
    }
}

/// Reads a boolean flag; unset or unrecognised values yield `None`.
pub(crate) fn env_flag(key: &str) -> Option<bool> {
    match std::env::var(key).ok()?.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
