//! Client for the Kusl Vault Auth API. Every endpoint answers with a JSON
//! envelope whose `status` field carries the application-level outcome; only
//! `200` counts as success. Bearer tokens travel in the `Authorization` header
//! and the refresh credential lives in an HTTP-only cookie held by the client's
//! cookie jar, never in request bodies.

pub mod error;
pub mod types;

pub use self::error::AuthError;

use self::{
    error::sanitize_body,
    types::{ChangePasswordRequest, Envelope, LoginRequest, RegisterRequest, TokenData},
};
use reqwest::{
    cookie::{CookieStore, Jar},
    header::AUTHORIZATION,
    Client,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout applied to every Auth API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope status signalling success.
pub const STATUS_OK: u32 = 200;

/// The Auth API operations the session manager relies on.
///
/// Kept narrow so the reconciliation logic can be driven by a scripted fake in
/// tests; the remaining endpoints live on [`AuthClient`] directly.
pub trait AuthApi: Send + Sync {
    /// Checks a bearer token. `Ok` only when the API answers with status 200.
    fn verify(&self, token: &SecretString) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Exchanges the out-of-band refresh credential for a new bearer token.
    fn refresh(&self) -> impl Future<Output = Result<SecretString, AuthError>> + Send;

    /// Tells the API to end the session. Callers treat any answer as terminal.
    fn logout(
        &self,
        token: Option<&SecretString>,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;
}

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Builds a client for the API rooted at `base_url`, e.g. `https://vault.kusl.dev/api`.
    ///
    /// # Errors
    /// Returns an error if the base URL is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|err| AuthError::Config(format!("invalid API base URL: {err}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AuthError::Config(format!(
                    "unsupported API URL scheme: {scheme}"
                )))
            }
        }

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            jar,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the cookies the jar would send to the refresh endpoint, as a
    /// `Cookie` header value, so the caller can persist them.
    #[must_use]
    pub fn refresh_cookies(&self) -> Option<String> {
        let url = self.endpoint("/auth/refresh").ok()?;
        let header = self.jar.cookies(&url)?;
        header.to_str().ok().map(ToString::to_string)
    }

    /// Seeds the cookie jar from a previously persisted `Cookie` header value.
    pub fn restore_refresh_cookies(&self, header: &str) {
        let Ok(url) = self.endpoint("/auth/refresh") else {
            return;
        };
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &url);
        }
    }

    /// Signs in with username and password.
    /// Returns the bearer token when the API hands one out; cookie-only
    /// deployments answer 200 without a token.
    ///
    /// # Errors
    /// Returns `AuthError::Rejected` with code 2003 for invalid credentials.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<SecretString>, AuthError> {
        let url = self.endpoint("/auth/login")?;
        let data: Option<TokenData> = self.post(url, None, Some(request)).await?;
        Ok(usable_token(data))
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// Returns an error if the API rejects the registration or is unreachable.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/register")?;
        let _: Option<serde_json::Value> = self.post(url, None, Some(request)).await?;
        Ok(())
    }

    /// Exchanges a Google access token for a Kusl Vault bearer token.
    ///
    /// # Errors
    /// Returns an error if the exchange fails or no token comes back.
    #[instrument(skip(self, provider_token))]
    pub async fn google(
        &self,
        provider_token: &SecretString,
        remember: bool,
    ) -> Result<SecretString, AuthError> {
        let mut url = self.endpoint("/auth/google")?;
        url.query_pairs_mut()
            .append_pair("r", if remember { "true" } else { "false" });
        let data: Option<TokenData> = self.post(url, Some(provider_token), None::<&()>).await?;
        require_token(data)
    }

    /// Starts a password reset. Returns the reset tracking id when the API sends one.
    ///
    /// # Errors
    /// Returns an error if no account matches or the API is unreachable.
    #[instrument(skip(self, email))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let mut url = self.endpoint("/auth/forgot-password")?;
        url.query_pairs_mut().append_pair("email", email);
        self.post(url, None, None::<&()>).await
    }

    /// Checks that a password reset token is still valid.
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired or the API is unreachable.
    #[instrument(skip(self, reset_token))]
    pub async fn reset_password(&self, reset_token: &SecretString) -> Result<(), AuthError> {
        let mut url = self.endpoint("/auth/reset-password")?;
        url.query_pairs_mut()
            .append_pair("token", reset_token.expose_secret());
        let _: Option<serde_json::Value> = self.post(url, None, None::<&()>).await?;
        Ok(())
    }

    /// Sets a new password using a reset token.
    ///
    /// # Errors
    /// Returns an error if the token is rejected or the API is unreachable.
    #[instrument(skip(self, reset_token, request))]
    pub async fn change_password(
        &self,
        reset_token: &SecretString,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let mut url = self.endpoint("/auth/change-password")?;
        url.query_pairs_mut()
            .append_pair("token", reset_token.expose_secret());
        let _: Option<serde_json::Value> = self.post(url, None, Some(request)).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        let raw = format!("{}/{}", self.base_url, path.trim().trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| AuthError::Config(format!("invalid endpoint URL: {err}")))
    }

    /// Posts to `url` and unwraps the response envelope.
    async fn post<B, T>(
        &self,
        url: Url,
        bearer: Option<&SecretString>,
        body: Option<&B>,
    ) -> Result<Option<T>, AuthError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url.path());

        let mut request = self.client.post(url);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }
        request = match body {
            Some(body) => request.json(body),
            None => request.json(&serde_json::json!({})),
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Http {
                status: status.as_u16(),
                message: sanitize_body(&body),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| AuthError::Decode(format!("failed to decode response: {err}")))?;

        if envelope.status == STATUS_OK {
            Ok(envelope.data)
        } else {
            debug!("API rejected request with status {}", envelope.status);
            Err(AuthError::Rejected {
                code: envelope.status,
                message: envelope.message.unwrap_or_default(),
            })
        }
    }
}

impl AuthApi for AuthClient {
    #[instrument(skip(self, token))]
    async fn verify(&self, token: &SecretString) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/verify")?;
        let _: Option<serde_json::Value> = self.post(url, Some(token), None::<&()>).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<SecretString, AuthError> {
        let url = self.endpoint("/auth/refresh")?;
        let data: Option<TokenData> = self.post(url, None, None::<&()>).await?;
        require_token(data)
    }

    #[instrument(skip(self, token))]
    async fn logout(&self, token: Option<&SecretString>) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/logout")?;
        let _: Option<serde_json::Value> = self.post(url, token, None::<&()>).await?;
        Ok(())
    }
}

/// The access token in `data`, unless it is missing or blank.
fn usable_token(data: Option<TokenData>) -> Option<SecretString> {
    data.and_then(|data| data.access_token)
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from)
}

fn require_token(data: Option<TokenData>) -> Result<SecretString, AuthError> {
    usable_token(data)
        .ok_or_else(|| AuthError::Decode("response did not include an access token".to_string()))
}
