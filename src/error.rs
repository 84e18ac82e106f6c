/// Boxed error returned by [`AuthProvider`](crate::provider::AuthProvider) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Rejection reported by the auth provider, passed through uninterpreted.
    #[error("Provider error: {0}")]
    Provider(BoxError),
    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Error payload returned by the provider's REST endpoint.
    #[cfg(feature = "rest")]
    #[error("{operation} rejected ({status}): {code}")]
    Rejected {
        operation: &'static str,
        status: u16,
        code: String,
    },
    #[error("No active provider session")]
    NoActiveSession,
    #[error("Cookie store error: {0}")]
    CookieStore(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
