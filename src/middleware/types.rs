use axum::Json;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

/// Redirect instruction produced by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub destination: String,
    pub permanent: bool,
}

impl RedirectTarget {
    /// Non-permanent redirect.
    #[must_use]
    pub fn temporary(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            permanent: false,
        }
    }
}

impl IntoResponse for RedirectTarget {
    fn into_response(self) -> Response {
        if self.permanent {
            Redirect::permanent(&self.destination).into_response()
        } else {
            Redirect::temporary(&self.destination).into_response()
        }
    }
}

/// Outcome of a page's pre-render hook: redirect, or render with props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageResponse<P> {
    Redirect(RedirectTarget),
    Props(P),
}

impl<P: Serialize> IntoResponse for PageResponse<P> {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(target) => target.into_response(),
            Self::Props(props) => Json(props).into_response(),
        }
    }
}

/// Props of a page that needs nothing beyond admission. Serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyProps {}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};

    use super::*;

    #[test]
    fn temporary_redirect_is_307() {
        let response = RedirectTarget::temporary("/").into_response();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[test]
    fn permanent_redirect_is_308() {
        let response = RedirectTarget {
            destination: "/moved".into(),
            permanent: true,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/moved");
    }

    #[test]
    fn empty_props_serialize_to_empty_object() {
        assert_eq!(serde_json::to_value(EmptyProps {}).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn page_response_serialization() {
        let redirect: PageResponse<EmptyProps> = PageResponse::Redirect(RedirectTarget::temporary("/"));
        assert_eq!(
            serde_json::to_value(&redirect).unwrap(),
            serde_json::json!({ "redirect": { "destination": "/", "permanent": false } })
        );

        let props = PageResponse::Props(EmptyProps {});
        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            serde_json::json!({ "props": {} })
        );
    }

    #[test]
    fn props_response_is_json() {
        let response = PageResponse::Props(EmptyProps {}).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
