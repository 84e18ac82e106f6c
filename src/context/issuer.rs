use axum_extra::extract::cookie::{Cookie, CookieJar};
use parking_lot::Mutex;
use time::Duration;
use url::Url;

use crate::config::SessionConfig;
use crate::cookies;
use crate::error::Error;
use crate::provider::AuthProvider;
use crate::types::IdToken;

/// Client-side cookie storage the session cookie is written to.
pub trait CookieStore: Send + Sync + 'static {
    /// Store a cookie, replacing any cookie with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CookieStore`] if the cookie cannot be written.
    fn set(&self, cookie: Cookie<'static>) -> Result<(), Error>;

    /// Current value of a cookie.
    fn get(&self, name: &str) -> Option<String>;

    /// Delete a cookie.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CookieStore`] if the cookie cannot be removed.
    fn remove(&self, name: &str) -> Result<(), Error>;
}

/// Cookie store backed by an in-memory [`CookieJar`].
pub struct MemoryCookieStore {
    jar: Mutex<CookieJar>,
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
        }
    }

    /// Snapshot of the stored cookies.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.jar.lock().clone()
    }

    /// Full stored cookie (attributes included).
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.jar.lock().get(name).cloned()
    }
}

impl CookieStore for MemoryCookieStore {
    fn set(&self, cookie: Cookie<'static>) -> Result<(), Error> {
        let mut jar = self.jar.lock();
        *jar = jar.clone().add(cookie);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<String> {
        self.jar.lock().get(name).map(|c| c.value().to_string())
    }

    fn remove(&self, name: &str) -> Result<(), Error> {
        let mut jar = self.jar.lock();
        *jar = jar.clone().remove(Cookie::new(name.to_string(), ""));
        Ok(())
    }
}

/// Result of the post-sign-in cookie step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieStatus {
    /// Token fetched and cookie written.
    Issued,
    /// Token fetch or cookie write failed; the message was logged.
    Failed(String),
}

impl CookieStatus {
    #[must_use]
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued)
    }
}

/// Post-sign-in step: fetch the identity token, persist it as the session
/// cookie, then fire the optional HTTP probe.
pub struct SessionCookieIssuer<C> {
    store: C,
    http: reqwest::Client,
    cookie_name: String,
    max_age: Duration,
    secure: bool,
    probe_url: Option<Url>,
}

impl<C: CookieStore> SessionCookieIssuer<C> {
    #[must_use]
    pub fn new(store: C, config: &SessionConfig) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            cookie_name: config.cookie_name.clone(),
            max_age: config.cookie_max_age,
            secure: config.secure_cookies,
            probe_url: config.probe_url.clone(),
        }
    }

    /// Use a custom HTTP client for the probe.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Fetch the identity token and write it to the session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the token fetch fails, or
    /// [`Error::CookieStore`] if the cookie cannot be written.
    pub async fn issue<P: AuthProvider>(&self, provider: &P) -> Result<IdToken, Error> {
        let token = provider.id_token().await.map_err(Error::Provider)?;
        let cookie =
            cookies::session_cookie(&self.cookie_name, token.as_str(), self.max_age, self.secure);
        self.store.set(cookie)?;
        Ok(token)
    }

    /// Run the whole post-sign-in step. Never fails: problems are logged and
    /// reported through [`CookieStatus`].
    pub async fn after_sign_in<P: AuthProvider>(&self, provider: &P) -> CookieStatus {
        let status = match self.issue(provider).await {
            Ok(_) => CookieStatus::Issued,
            Err(e) => {
                tracing::warn!(error = %e, cookie = %self.cookie_name, "Session cookie not issued");
                CookieStatus::Failed(e.to_string())
            }
        };
        self.probe();
        status
    }

    /// Delete the session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CookieStore`] if the store rejects the removal.
    pub fn clear(&self) -> Result<(), Error> {
        self.store.remove(&self.cookie_name)
    }

    /// Fire-and-forget GET of the probe URL; status or error is only logged.
    ///
    /// Returns whether a request was dispatched: nothing is sent when no probe
    /// URL is configured or no Tokio runtime is running.
    pub fn probe(&self) -> bool {
        let Some(url) = self.probe_url.clone() else {
            return false;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(url = %url, "No runtime for session probe");
            return false;
        };

        let http = self.http.clone();
        runtime.spawn(async move {
            match http.get(url.clone()).send().await {
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status().as_u16(), "Session probe");
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "Session probe failed"),
            }
        });
        true
    }
}
