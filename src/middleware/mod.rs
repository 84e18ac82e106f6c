//! Protected-page gate for Axum.
//!
//! Admits a request to a protected page when the session cookie written by
//! [`SessionContext`](crate::SessionContext) is present, and redirects to the
//! public page otherwise.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use session_context::middleware::{GateConfig, protected_routes};
//!
//! let app = axum::Router::new()
//!     .merge(protected_routes(GateConfig::from_env()));
//!
//! // Or gate your own handlers with the extractor
//! async fn account(_session: SessionCookie) -> Html<&'static str> { ... }
//! ```

mod config;
mod extractor;
mod routes;
mod state;
mod types;

pub use config::GateConfig;
pub use extractor::{SessionCookie, server_side_props};
pub use routes::protected_routes;
pub use state::GateState;
pub use types::{EmptyProps, PageResponse, RedirectTarget};
