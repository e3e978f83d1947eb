//! GoTrue-compatible identity provider.
//!
//! Talks to `/auth/v1/user`, `/auth/v1/token?grant_type=password` and
//! `/auth/v1/logout`, authenticating with the project's anon key.

use async_trait::async_trait;
use flashprep_core::error::{FlashprepError, Result};
use flashprep_core::session::{IdentityProvider, ProviderSession, SessionChanges};
use flashprep_core::user::User;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::broadcaster::SessionBroadcaster;
use crate::config_service::AuthConfig;

const GENERIC_AUTH_FAILURE: &str = "Authentication request failed";

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user_metadata: Option<Value>,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        let name = user.user_metadata.as_ref().and_then(|meta| {
            ["name", "full_name"]
                .into_iter()
                .find_map(|key| meta.get(key).and_then(Value::as_str))
                .map(str::to_string)
        });
        User {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Identity provider backed by a GoTrue auth server.
///
/// The session lives in memory; a previously issued access token can be
/// restored with [`GoTrueIdentityProvider::with_access_token`] and is
/// validated on the first session query.
pub struct GoTrueIdentityProvider {
    client: Client,
    config: AuthConfig,
    stored_token: std::sync::Mutex<Option<String>>,
    sessions: SessionBroadcaster,
}

impl GoTrueIdentityProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            stored_token: std::sync::Mutex::new(None),
            sessions: SessionBroadcaster::default(),
        }
    }

    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        self.set_stored_token(Some(token.into()));
        self
    }

    fn stored_token(&self) -> Option<String> {
        self.stored_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_stored_token(&self, token: Option<String>) {
        *self
            .stored_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.url, path)
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.config.anon_key)
    }

    /// Exchanges email and password for a session and notifies subscribers.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession> {
        let request = self
            .with_api_key(self.client.post(self.url("/token")))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let response = send(request).await?;
        let token: TokenResponse = response.json().await?;

        let session = ProviderSession::new(token.user.into(), token.access_token);
        self.set_stored_token(Some(session.access_token.clone()));
        tracing::info!("[GoTrue] signed in as {}", session.user.email);
        self.sessions.publish(Some(session.clone()));
        Ok(session)
    }

    pub fn active_subscribers(&self) -> usize {
        self.sessions.active_subscribers()
    }
}

/// Sends an auth-server request and checks its status.
///
/// Separate from `ApiClient::execute`: the auth server lives at another base
/// URL with `apikey` headers, and reports errors under `error_description` or
/// `msg` rather than `message`.
async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| FlashprepError::transport(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = ["error_description", "msg", "message"]
        .into_iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .unwrap_or(GENERIC_AUTH_FAILURE)
        .to_string();
    Err(FlashprepError::request(status.as_u16(), message))
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>> {
        if let Some(session) = self.sessions.current() {
            return Ok(Some(session));
        }
        let Some(token) = self.stored_token() else {
            return Ok(None);
        };

        let request = self
            .with_api_key(self.client.get(self.url("/user")))
            .bearer_auth(&token);
        match send(request).await {
            Ok(response) => {
                let user: AuthUser = response.json().await?;
                let session = ProviderSession::new(user.into(), token);
                self.sessions.set_silently(Some(session.clone()));
                Ok(Some(session))
            }
            Err(err) if err.is_auth_rejection() => {
                tracing::info!("[GoTrue] stored token rejected: {}", err);
                self.set_stored_token(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.stored_token();
        self.set_stored_token(None);
        self.sessions.publish(None);

        let Some(token) = token else {
            return Ok(());
        };
        let request = self
            .with_api_key(self.client.post(self.url("/logout")))
            .bearer_auth(token);
        send(request).await.map(|_| ())
    }

    fn subscribe(&self) -> SessionChanges {
        self.sessions.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GoTrueIdentityProvider {
        GoTrueIdentityProvider::new(AuthConfig {
            url: server.uri(),
            anon_key: "anon".to_string(),
        })
    }

    fn user_json() -> Value {
        json!({
            "id": "u1",
            "email": "ada@example.com",
            "created_at": "2024-01-15T00:00:00Z",
            "user_metadata": {"full_name": "Ada Lovelace"}
        })
    }

    #[tokio::test]
    async fn test_no_stored_token_means_no_session() {
        let server = MockServer::start().await;
        let provider = provider_for(&server);
        assert_eq!(provider.get_session().await.unwrap(), None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_token_is_validated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer stored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_access_token("stored");
        let session = provider.get_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "stored");
        assert_eq!(session.user.name.as_deref(), Some("Ada Lovelace"));

        // Cached after the first query.
        assert!(provider.get_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_token_yields_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_access_token("stale");
        assert_eq!(provider.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_during_query_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_access_token("tok");
        let err = provider.get_session().await.unwrap_err();
        assert_eq!(err, FlashprepError::request(500, GENERIC_AUTH_FAILURE));
    }

    #[tokio::test]
    async fn test_password_sign_in_publishes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "refresh_token": "r",
                "user": user_json()
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let mut changes = provider.subscribe();
        let session = provider
            .sign_in_with_password("ada@example.com", "pw")
            .await
            .unwrap();

        assert_eq!(session.access_token, "fresh");
        assert_eq!(changes.recv().await, Some(Some(session)));
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .sign_in_with_password("ada@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err, FlashprepError::request(400, "Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_locally_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_access_token("tok");
        let mut changes = provider.subscribe();
        assert!(provider.sign_out().await.is_err());
        assert_eq!(changes.recv().await, Some(None));
        assert_eq!(provider.get_session().await.unwrap(), None);
    }
}
