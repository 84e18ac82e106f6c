use std::sync::Arc;

use super::config::GateConfig;

/// Shared state for gate extractors and page handlers.
///
/// Embed it in your own state and implement `FromRef` to use
/// [`SessionCookie`](super::SessionCookie) in your handlers.
#[derive(Clone)]
pub struct GateState {
    pub(super) config: Arc<GateConfig>,
}

impl GateState {
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}
