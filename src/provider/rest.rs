use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AuthProvider, AuthStateListener, AuthStateNotifier, Subscription};
use crate::error::{BoxError, Error};
use crate::types::{Credentials, IdToken, ProviderUser, UserId};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit REST configuration.
///
/// ```rust,ignore
/// use session_context::provider::rest::RestConfig;
///
/// let config = RestConfig::new("my-web-api-key");
/// // Point at a local emulator:
/// let config = config
///     .with_base_url("http://localhost:9099/identitytoolkit.googleapis.com/v1".parse()?)?;
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RestConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: Url,
}

impl RestConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.parse().expect("valid default URL"),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `FIREBASE_API_KEY`: Web API key of the project
    ///
    /// # Optional env vars
    /// - `FIREBASE_AUTH_URL`: Override the REST base URL (e.g. an emulator)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the key is missing or the URL is invalid or
    /// cannot carry a path.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("FIREBASE_API_KEY")
            .map_err(|_| Error::Config("FIREBASE_API_KEY is required".into()))?;
        let mut config = Self::new(api_key);

        if let Ok(url_str) = std::env::var("FIREBASE_AUTH_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("FIREBASE_AUTH_URL: {e}")))?;
            config = config.with_base_url(url)?;
        }

        Ok(config)
    }

    /// Override the REST base URL (e.g. an emulator).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `url` cannot have path segments
    /// (`mailto:`, `data:` and the like).
    pub fn with_base_url(mut self, url: Url) -> Result<Self, Error> {
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("base URL cannot carry a path: {url}")));
        }
        self.base_url = url;
        Ok(self)
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of an `accounts:*` method, with the API key attached.
    fn endpoint(&self, method: &str) -> Url {
        let mut url = self.base_url.clone();
        // `with_base_url` only admits base URLs that take path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(method);
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        url
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Success payload shared by `accounts:signUp` and `accounts:signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

impl PasswordResponse {
    fn user(&self) -> ProviderUser {
        let mut user = ProviderUser::new(UserId(self.local_id.clone()));
        user.email.clone_from(&self.email);
        // signUp responses omit displayName; signIn sends "" for unnamed users
        user.display_name = self.display_name.clone().filter(|n| !n.is_empty());
        user
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct ActiveSession {
    user: ProviderUser,
    id_token: IdToken,
}

/// Provider backed by the Identity Toolkit REST API.
///
/// Holds at most one provider session in memory. Sign-out is local: the held
/// token is dropped and "no user" is published.
pub struct RestProvider {
    config: RestConfig,
    http: reqwest::Client,
    active: Mutex<Option<ActiveSession>>,
    notifier: AuthStateNotifier,
}

impl RestProvider {
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            active: Mutex::new(None),
            notifier: AuthStateNotifier::resolved(None),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Runs a password-based `accounts:*` call and starts a provider session.
    async fn password_call(
        &self,
        operation: &'static str,
        method: &str,
        credentials: &Credentials,
    ) -> Result<ProviderUser, Error> {
        let body = PasswordRequest {
            email: &credentials.email,
            password: &credentials.password,
            return_secure_token: true,
        };

        let response = self
            .http
            .post(self.config.endpoint(method))
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        let payload: PasswordResponse = response.json().await?;
        let user = payload.user();

        *self.active.lock() = Some(ActiveSession {
            user: user.clone(),
            id_token: IdToken::from(payload.id_token),
        });
        self.notifier.publish(Some(user.clone()));

        tracing::debug!(uid = %user.uid, operation, "Provider session started");
        Ok(user)
    }

    /// Checks HTTP response status; returns the response on success or the
    /// provider's error code.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Rejected {
            operation,
            status,
            code: error_code(&body),
        })
    }
}

/// Extracts `error.message` (e.g. `EMAIL_EXISTS`) from an error body, falling back to the raw body.
fn error_code(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

impl AuthProvider for RestProvider {
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.notifier.subscribe(listener)
    }

    async fn create_user(&self, credentials: Credentials) -> Result<ProviderUser, BoxError> {
        self.password_call("sign-up", "accounts:signUp", &credentials)
            .await
            .map_err(BoxError::from)
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<ProviderUser, BoxError> {
        self.password_call("sign-in", "accounts:signInWithPassword", &credentials)
            .await
            .map_err(BoxError::from)
    }

    async fn sign_out(&self) -> Result<(), BoxError> {
        let previous = self.active.lock().take();
        if let Some(session) = previous {
            tracing::debug!(uid = %session.user.uid, "Provider session ended");
        }
        self.notifier.publish(None);
        Ok(())
    }

    async fn id_token(&self) -> Result<IdToken, BoxError> {
        let token = self
            .active
            .lock()
            .as_ref()
            .map(|session| session.id_token.clone())
            .ok_or(Error::NoActiveSession)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Json;
    use axum::http::{StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use serde_json::{Value, json};

    use super::*;

    /// Stands in for the Identity Toolkit: sign-up is rejected with
    /// `EMAIL_EXISTS`, sign-in succeeds for any credentials.
    async fn identity_toolkit(uri: Uri, Json(body): Json<Value>) -> Response {
        if uri.query() != Some("key=test-key") {
            return StatusCode::FORBIDDEN.into_response();
        }
        match uri.path() {
            "/v1/accounts:signUp" => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": 400, "message": "EMAIL_EXISTS", "errors": [] }
                })),
            )
                .into_response(),
            "/v1/accounts:signInWithPassword" => Json(json!({
                "localId": "uid-1",
                "email": body["email"],
                "displayName": "Ada",
                "idToken": "tok-1",
                "registered": true,
            }))
            .into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn stub_provider() -> RestProvider {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().fallback(identity_toolkit);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RestConfig::new("test-key")
            .with_base_url(format!("http://{addr}/v1").parse().unwrap())
            .unwrap();
        RestProvider::new(config)
    }

    fn record(provider: &RestProvider) -> (Arc<Mutex<Vec<Option<String>>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = provider.on_auth_state_changed(Box::new(move |user: Option<&ProviderUser>| {
            sink.lock().push(user.map(|u| u.uid.to_string()));
        }));
        (seen, sub)
    }

    #[test]
    fn default_endpoints() {
        let config = RestConfig::new("test-key");

        assert_eq!(
            config.endpoint("accounts:signUp").as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=test-key"
        );
        assert_eq!(
            config.endpoint("accounts:signInWithPassword").as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=test-key"
        );
    }

    #[test]
    fn base_url_with_trailing_slash() {
        let config = RestConfig::new("k")
            .with_base_url("http://localhost:9099/identitytoolkit.googleapis.com/v1/".parse().unwrap())
            .unwrap();

        assert_eq!(
            config.endpoint("accounts:signUp").as_str(),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signUp?key=k"
        );
    }

    #[test]
    fn request_body_uses_camel_case() {
        let body = PasswordRequest {
            email: "a@example.com",
            password: "secret1",
            return_secure_token: true,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "email": "a@example.com",
                "password": "secret1",
                "returnSecureToken": true,
            })
        );
    }

    #[test]
    fn sign_in_payload_maps_to_user() {
        let payload: PasswordResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "localId": "uid-1",
                "email": "a@example.com",
                "displayName": "",
                "idToken": "tok",
                "registered": true,
                "refreshToken": "refresh",
                "expiresIn": "3600"
            }"#,
        )
        .unwrap();
        let user = payload.user();

        assert_eq!(user.uid.to_string(), "uid-1");
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
        assert_eq!(user.display_name, None);
        assert_eq!(payload.id_token, "tok");
    }

    #[test]
    fn error_code_from_envelope() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        assert_eq!(error_code(body), "EMAIL_EXISTS");
        assert_eq!(error_code("bad gateway"), "bad gateway");
    }

    #[tokio::test]
    async fn id_token_without_session_fails() {
        let provider = RestProvider::new(RestConfig::new("k"));
        let err = provider.id_token().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn starts_resolved_with_no_user() {
        let provider = RestProvider::new(RestConfig::new("k"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = provider.on_auth_state_changed(Box::new(move |user: Option<&ProviderUser>| {
            sink.lock().push(user.is_some());
        }));

        provider.sign_out().await.unwrap();
        assert_eq!(*seen.lock(), vec![false, false]);
    }

    #[test]
    fn base_url_without_path_is_rejected() {
        let err = RestConfig::new("k")
            .with_base_url("mailto:auth@example.com".parse().unwrap())
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn rejected_sign_up_maps_error_payload() {
        let provider = stub_provider().await;
        let (seen, _sub) = record(&provider);

        let err = provider
            .create_user(Credentials::new("a@example.com", "secret1"))
            .await
            .unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::Rejected {
                operation,
                status,
                code,
            }) => {
                assert_eq!(*operation, "sign-up");
                assert_eq!(*status, 400);
                assert_eq!(code, "EMAIL_EXISTS");
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
        assert_eq!(*seen.lock(), vec![None], "no session is published");
        assert!(provider.id_token().await.is_err());
    }

    #[tokio::test]
    async fn sign_in_starts_session_and_publishes_user() {
        let provider = stub_provider().await;
        let (seen, _sub) = record(&provider);

        let user = provider
            .sign_in(Credentials::new("a@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(user.uid.to_string(), "uid-1");
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert_eq!(*seen.lock(), vec![None, Some("uid-1".to_string())]);
        assert_eq!(provider.id_token().await.unwrap().as_str(), "tok-1");

        provider.sign_out().await.unwrap();
        assert_eq!(seen.lock().last(), Some(&None));
        assert!(provider.id_token().await.is_err());
    }
}
