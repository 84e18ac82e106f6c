//! Session context: the single source of truth for who is signed in.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use session_context::{Credentials, SessionConfig, SessionContext};
//! use session_context::context::MemoryCookieStore;
//!
//! let ctx = SessionContext::new(Arc::new(provider), MemoryCookieStore::new(), SessionConfig::default());
//!
//! // Render nothing until the provider has reported its initial state
//! let snapshot = ctx.ready().await;
//!
//! let outcome = ctx.sign_in(Credentials::new(email, password)).await?;
//! router.navigate(&outcome.redirect_to);
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::error::Error;
use crate::provider::{AuthProvider, Subscription};
use crate::types::{Credentials, ProviderUser, Session};

mod issuer;

pub use issuer::{CookieStatus, CookieStore, MemoryCookieStore, SessionCookieIssuer};

/// What the UI reads from the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Signed-in user, if any.
    pub session: Option<Session>,
    /// `true` until the provider's first auth-state callback.
    pub loading: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Returned by [`SessionContext::sign_in`]. The caller owns navigation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SignInOutcome {
    /// The user the provider signed in.
    pub session: Session,
    /// Where the presentation layer should navigate next.
    pub redirect_to: String,
    /// Outcome of the session cookie step. Navigation does not depend on it.
    pub cookie: CookieStatus,
}

/// Provider-backed session state plus sign-up/sign-in/sign-out actions.
///
/// Subscribes to the provider's auth-state stream on construction and
/// unsubscribes when dropped.
pub struct SessionContext<P, C> {
    provider: Arc<P>,
    issuer: SessionCookieIssuer<C>,
    config: SessionConfig,
    state: Arc<watch::Sender<SessionSnapshot>>,
    _subscription: Subscription,
}

impl<P: AuthProvider, C: CookieStore> SessionContext<P, C> {
    /// Create the context and register its auth-state listener.
    #[must_use]
    pub fn new(provider: Arc<P>, cookies: C, config: SessionConfig) -> Self {
        let issuer = SessionCookieIssuer::new(cookies, &config);
        Self::with_issuer(provider, issuer, config)
    }

    /// Like [`new`](Self::new), with a preconfigured cookie issuer.
    #[must_use]
    pub fn with_issuer(
        provider: Arc<P>,
        issuer: SessionCookieIssuer<C>,
        config: SessionConfig,
    ) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::initial());
        let state = Arc::new(tx);

        let sink = Arc::clone(&state);
        let subscription = provider.on_auth_state_changed(Box::new(
            move |user: Option<&ProviderUser>| {
                match user {
                    Some(u) => tracing::debug!(uid = %u.uid, "Auth state changed: signed in"),
                    None => tracing::debug!("Auth state changed: signed out"),
                }
                sink.send_replace(SessionSnapshot {
                    session: user.map(Session::from),
                    loading: false,
                });
            },
        ));

        Self {
            provider,
            issuer,
            config,
            state,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Wait for the provider's first auth-state callback.
    pub async fn ready(&self) -> SessionSnapshot {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(snapshot) => snapshot.clone(),
            // Unreachable while `self` holds the sender
            Err(_) => self.snapshot(),
        }
    }

    /// Render gate: `None` while loading, otherwise `f` applied to the session.
    pub fn render<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> Option<T> {
        let snapshot = self.snapshot();
        if snapshot.loading {
            return None;
        }
        Some(f(snapshot.session.as_ref()))
    }

    /// Create an account with the provider.
    ///
    /// The session is populated later, by the provider's auth-state callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] with the provider's rejection.
    pub async fn sign_up(&self, credentials: Credentials) -> Result<(), Error> {
        let user = self
            .provider
            .create_user(credentials)
            .await
            .map_err(Error::Provider)?;

        tracing::info!(uid = %user.uid, "Account created");
        Ok(())
    }

    /// Sign in with the provider, then issue the session cookie.
    ///
    /// Returns once the cookie step has finished, so navigating to
    /// [`SignInOutcome::redirect_to`] cannot race the cookie write. Failures
    /// of the cookie step are logged and reported in
    /// [`SignInOutcome::cookie`], never returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the provider rejects the credentials.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignInOutcome, Error> {
        let user = self
            .provider
            .sign_in(credentials)
            .await
            .map_err(Error::Provider)?;

        tracing::info!(uid = %user.uid, "Sign-in successful");

        let cookie = self.issuer.after_sign_in(self.provider.as_ref()).await;

        Ok(SignInOutcome {
            session: Session::from(&user),
            redirect_to: self.config.sign_in_redirect.clone(),
            cookie,
        })
    }

    /// Clear the local session, then end the provider session.
    ///
    /// The local session is cleared before the provider call starts. The
    /// session cookie is removed too unless disabled in [`SessionConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the provider's sign-out fails. Local
    /// state stays cleared.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.state.send_modify(|s| s.session = None);

        if self.config.clear_cookie_on_sign_out {
            if let Err(e) = self.issuer.clear() {
                tracing::warn!(error = %e, "Session cookie not cleared on sign-out");
            }
        }

        self.provider.sign_out().await.map_err(Error::Provider)?;

        tracing::info!("Signed out");
        Ok(())
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    #[must_use]
    pub fn cookies(&self) -> &C {
        self.issuer.store()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
