use crate::config::SESSION_COOKIE_NAME;

/// Protected-page gate configuration.
///
/// Use [`from_env()`](GateConfig::from_env) for convention-based setup,
/// or [`GateConfig::default()`] with `with_*` methods for full control.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GateConfig {
    pub(crate) cookie_name: String,
    pub(crate) public_redirect: String,
    pub(crate) protected_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.into(),
            public_redirect: "/".into(),
            protected_path: "/dashboard".into(),
        }
    }
}

impl GateConfig {
    /// Create config from environment variables. Every variable is optional.
    ///
    /// - `SESSION_COOKIE_NAME`: Cookie whose presence admits a request
    /// - `GATE_PUBLIC_REDIRECT`: Where requests without the cookie are sent
    /// - `GATE_PROTECTED_PATH`: Path of the protected page
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_cookie_name(name);
        }
        if let Ok(path) = std::env::var("GATE_PUBLIC_REDIRECT") {
            config = config.with_public_redirect(path);
        }
        if let Ok(path) = std::env::var("GATE_PROTECTED_PATH") {
            config = config.with_protected_path(path);
        }

        config
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_public_redirect(mut self, path: impl Into<String>) -> Self {
        self.public_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_protected_path(mut self, path: impl Into<String>) -> Self {
        self.protected_path = path.into();
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn public_redirect(&self) -> &str {
        &self.public_redirect
    }

    #[must_use]
    pub fn protected_path(&self) -> &str {
        &self.protected_path
    }
}
