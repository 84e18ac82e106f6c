use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use ulid::Ulid;

use super::{AuthProvider, AuthStateListener, AuthStateNotifier, Subscription};
use crate::error::BoxError;
use crate::types::{Credentials, IdToken, ProviderUser, UserId};

/// Minimum password length accepted on account creation.
const MIN_PASSWORD_LEN: usize = 6;

/// Rejections produced by [`MemoryProvider`], named after the provider's error codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MemoryProviderError {
    #[error("EMAIL_EXISTS")]
    EmailExists,
    #[error("INVALID_EMAIL")]
    InvalidEmail,
    #[error("WEAK_PASSWORD")]
    WeakPassword,
    #[error("INVALID_LOGIN_CREDENTIALS")]
    InvalidCredentials,
    #[error("NO_ACTIVE_SESSION")]
    NoActiveSession,
}

struct Account {
    user: ProviderUser,
    password: String,
}

/// In-process provider for development and tests.
///
/// Accounts live in memory keyed by email; uids are ULIDs. Starts unresolved
/// (no auth-state callback) until [`resolve`](MemoryProvider::resolve) is called,
/// or already resolved via [`MemoryProvider::resolved`].
pub struct MemoryProvider {
    accounts: Mutex<HashMap<String, Account>>,
    tokens_issued: AtomicU64,
    notifier: AuthStateNotifier,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            tokens_issued: AtomicU64::new(0),
            notifier: AuthStateNotifier::new(),
        }
    }

    /// Provider that already knows nobody is signed in.
    #[must_use]
    pub fn resolved() -> Self {
        let provider = Self::new();
        provider.resolve();
        provider
    }

    /// Seed an account without signing it in.
    #[must_use]
    pub fn with_account(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        let email = email.into();
        let user = ProviderUser::new(UserId(Ulid::new().to_string())).with_email(email.clone());
        self.accounts.lock().insert(
            email,
            Account {
                user,
                password: password.into(),
            },
        );
        self
    }

    /// Publish the initial "no user" state if nothing has been published yet.
    pub fn resolve(&self) {
        if !self.notifier.is_resolved() {
            self.notifier.publish(None);
        }
    }

    /// The user the provider currently considers signed in.
    #[must_use]
    pub fn current_user(&self) -> Option<ProviderUser> {
        self.notifier.current()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }
}

impl AuthProvider for MemoryProvider {
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.notifier.subscribe(listener)
    }

    async fn create_user(&self, credentials: Credentials) -> Result<ProviderUser, BoxError> {
        if !credentials.email.contains('@') {
            return Err(MemoryProviderError::InvalidEmail.into());
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(MemoryProviderError::WeakPassword.into());
        }

        let user = {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(&credentials.email) {
                return Err(MemoryProviderError::EmailExists.into());
            }
            let user = ProviderUser::new(UserId(Ulid::new().to_string()))
                .with_email(credentials.email.clone());
            accounts.insert(
                credentials.email,
                Account {
                    user: user.clone(),
                    password: credentials.password,
                },
            );
            user
        };

        self.notifier.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<ProviderUser, BoxError> {
        let user = {
            let accounts = self.accounts.lock();
            match accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.user.clone(),
                _ => return Err(MemoryProviderError::InvalidCredentials.into()),
            }
        };

        self.notifier.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BoxError> {
        self.notifier.publish(None);
        Ok(())
    }

    async fn id_token(&self) -> Result<IdToken, BoxError> {
        let user = self
            .notifier
            .current()
            .ok_or(MemoryProviderError::NoActiveSession)?;
        let serial = self.tokens_issued.fetch_add(1, Ordering::Relaxed);
        Ok(IdToken::from(format!("mem.{}.{serial}", user.uid)))
    }
}
