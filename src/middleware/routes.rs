use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;

use super::config::GateConfig;
use super::extractor::{SessionCookie, server_side_props};
use super::state::GateState;
use super::types::{EmptyProps, PageResponse};

/// Prefix of the props endpoint served next to each protected page.
const PROPS_PREFIX: &str = "/_props";

/// Create the router for the protected page.
///
/// Serves the page at the configured protected path and its pre-render props
/// at `/_props{path}`. Both redirect to the public page when the session
/// cookie is missing.
pub fn protected_routes(config: GateConfig) -> Router {
    let path = config.protected_path.clone();

    Router::new()
        .route(&path, get(protected_page))
        .route(&format!("{PROPS_PREFIX}{path}"), get(page_props))
        .with_state(GateState::new(config))
}

async fn protected_page(SessionCookie(_token): SessionCookie) -> Html<&'static str> {
    Html("<h1>Dashboard</h1>")
}

async fn page_props(State(state): State<GateState>, jar: CookieJar) -> PageResponse<EmptyProps> {
    server_side_props(&jar, &state.config)
}
