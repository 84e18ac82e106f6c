#![doc = include_str!("../README.md")]

pub mod config;
pub mod context;
mod cookies;
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod provider;
pub mod types;

// Re-exports for convenient access
pub use config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SessionConfig};
pub use context::{
    CookieStatus, CookieStore, MemoryCookieStore, SessionContext, SessionSnapshot, SignInOutcome,
};
pub use error::{BoxError, Error};
pub use provider::memory::MemoryProvider;
#[cfg(feature = "rest")]
pub use provider::rest::{RestConfig, RestProvider};
pub use provider::{AuthProvider, AuthStateListener, AuthStateNotifier, Subscription};
pub use types::{Credentials, IdToken, ProviderUser, Session, UserId};
