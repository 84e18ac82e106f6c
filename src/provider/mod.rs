//! Seam between the session context and an external authentication provider.
//!
//! The provider owns credentials and sessions; this crate only listens to its
//! session-change stream and forwards actions to it.

use std::future::Future;

use crate::error::BoxError;
use crate::types::{Credentials, IdToken, ProviderUser};

pub mod memory;
mod notifier;
#[cfg(feature = "rest")]
pub mod rest;

pub use notifier::AuthStateNotifier;

/// Callback registered with [`AuthProvider::on_auth_state_changed`].
///
/// Receives the signed-in user, or `None` once the provider reports no session.
pub type AuthStateListener = Box<dyn Fn(Option<&ProviderUser>) + Send + Sync>;

/// Registration handle for an auth-state listener.
///
/// Dropping the handle deregisters the listener.
#[must_use = "dropping a Subscription immediately deregisters its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Deregister the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// External authentication provider.
///
/// Errors are provider-defined and surface to callers uninterpreted.
///
/// # Example
///
/// ```rust,ignore
/// impl AuthProvider for MyProvider {
///     fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
///         self.notifier.subscribe(listener)
///     }
///
///     async fn sign_in(&self, credentials: Credentials) -> Result<ProviderUser, BoxError> {
///         let user = self.api.verify_password(&credentials).await?;
///         self.notifier.publish(Some(user.clone()));
///         Ok(user)
///     }
///     // ...
/// }
/// ```
pub trait AuthProvider: Send + Sync + 'static {
    /// Register a session-change listener.
    ///
    /// The listener fires once shortly after registration (as soon as the
    /// provider knows its initial state) and again on every change.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;

    /// Create an account. On success the new user is signed in.
    fn create_user(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<ProviderUser, BoxError>> + Send;

    /// Verify credentials and start a provider session.
    fn sign_in(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<ProviderUser, BoxError>> + Send;

    /// Terminate the provider session.
    fn sign_out(&self) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Identity token of the active provider session.
    fn id_token(&self) -> impl Future<Output = Result<IdToken, BoxError>> + Send;
}
