//! Submit handlers for the auth pages. Each flow validates its form, calls the
//! Auth API and, where a credential comes back, records it with the session
//! manager. Errors are shaped for display: field errors inline, business
//! failures as a page-level message, transport failures as a generic retry hint.

use crate::{
    api::{
        error::STATUS_INVALID_CREDENTIALS,
        types::{ChangePasswordRequest, LoginRequest, RegisterRequest},
        AuthApi, AuthClient, AuthError,
    },
    forms::{ForgotPasswordForm, ResetPasswordForm, SignInForm, SignUpForm, ValidationErrors},
    session::{paths, LoginError, SessionManager},
    store::ClientStore,
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

const GOOGLE_FAILED: &str = "An error occurred during Google login";
const NO_SUCH_USER: &str = "No user found with this email address";
const INVALID_RESET_TOKEN: &str = "Invalid or expired token";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error("Something went wrong. Please try again later.")]
    Unavailable(#[source] AuthError),
    #[error("session could not be recorded: {0}")]
    Session(#[from] LoginError),
}

impl From<ValidationErrors> for FlowError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// GitHub OAuth app settings used to build the authorize redirect.
#[derive(Clone, Debug)]
pub struct GithubOAuth {
    pub client_id: String,
    pub redirect_uri: String,
}

/// Signs in with username and password and records the session.
/// Returns the path to navigate to.
///
/// # Errors
/// Returns field errors, `InvalidCredentials` for a 2003 answer, or
/// `Unavailable` when the API cannot be reached.
#[instrument(skip(client, session, form), fields(username = %form.username))]
pub async fn sign_in<A, S>(
    client: &AuthClient,
    session: &SessionManager<A, S>,
    form: &SignInForm,
) -> Result<&'static str, FlowError>
where
    A: AuthApi,
    S: ClientStore,
{
    form.validate()?;

    let request = LoginRequest {
        username: form.username.clone(),
        password: form.password.clone(),
        remember: form.remember,
    };

    let token = match client.login(&request).await {
        Ok(Some(token)) => token,
        // cookie-only answer: trade the fresh refresh cookie for a bearer token
        Ok(None) => client.refresh().await.map_err(FlowError::Unavailable)?,
        Err(err) if err.code() == Some(STATUS_INVALID_CREDENTIALS) => {
            return Err(FlowError::InvalidCredentials)
        }
        Err(err @ AuthError::Rejected { .. }) => {
            return Err(FlowError::Rejected(
                err.server_message()
                    .unwrap_or("Invalid username or password")
                    .to_string(),
            ))
        }
        Err(err) => return Err(FlowError::Unavailable(err)),
    };

    session.login(token)?;
    info!("signed in");
    Ok(paths::HOME)
}

/// Registers an account. On success the user continues at sign-in.
///
/// # Errors
/// Returns field errors, the API's rejection message, or `Unavailable`.
#[instrument(skip(client, form), fields(username = %form.username))]
pub async fn sign_up(client: &AuthClient, form: &SignUpForm) -> Result<&'static str, FlowError> {
    form.validate()?;

    let request = RegisterRequest {
        username: form.username.clone(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
    };

    match client.register(&request).await {
        Ok(()) => Ok(paths::SIGN_IN),
        Err(err @ AuthError::Rejected { .. }) => Err(FlowError::Rejected(
            err.server_message()
                .unwrap_or(REGISTRATION_FAILED)
                .to_string(),
        )),
        Err(err) => Err(FlowError::Unavailable(err)),
    }
}

/// Exchanges a Google access token and records the session.
///
/// # Errors
/// Returns the API's message, or a generic Google login message.
#[instrument(skip(client, session, provider_token))]
pub async fn google_sign_in<A, S>(
    client: &AuthClient,
    session: &SessionManager<A, S>,
    provider_token: &SecretString,
    remember: bool,
) -> Result<&'static str, FlowError>
where
    A: AuthApi,
    S: ClientStore,
{
    match client.google(provider_token, remember).await {
        Ok(token) => {
            session.login(token)?;
            info!("signed in with Google");
            Ok(paths::HOME)
        }
        Err(err) => {
            warn!("Google exchange failed: {err}");
            Err(FlowError::Rejected(
                err.server_message().unwrap_or(GOOGLE_FAILED).to_string(),
            ))
        }
    }
}

/// Builds the GitHub authorize URL. The remember flag travels in `state` and
/// comes back to the API's callback.
///
/// # Errors
/// Returns an error if the authorize URL cannot be parsed.
pub fn github_authorize_url(github: &GithubOAuth, remember: bool) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(GITHUB_AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", &github.client_id)
        .append_pair("redirect_uri", &github.redirect_uri)
        .append_pair("state", if remember { "true" } else { "false" })
        .append_pair("prompt", "select_account");
    Ok(url)
}

/// Requests a password reset email. Returns the reset tracking id, if any.
///
/// # Errors
/// Returns field errors, `Rejected` when no account matches, or `Unavailable`.
#[instrument(skip(client, form))]
pub async fn forgot_password(
    client: &AuthClient,
    form: &ForgotPasswordForm,
) -> Result<Option<String>, FlowError> {
    form.validate()?;

    match client.forgot_password(form.email.trim()).await {
        Ok(tracking) => Ok(tracking),
        Err(AuthError::Rejected { .. }) => Err(FlowError::Rejected(NO_SUCH_USER.to_string())),
        Err(err) => Err(FlowError::Unavailable(err)),
    }
}

/// Sets a new password with a reset token. The token is checked before the
/// form, so a dead link is reported even for valid input.
///
/// # Errors
/// Returns `Rejected` for an invalid or expired token, field errors, or `Unavailable`.
#[instrument(skip(client, reset_token, form))]
pub async fn reset_password(
    client: &AuthClient,
    reset_token: &SecretString,
    form: &ResetPasswordForm,
) -> Result<&'static str, FlowError> {
    if reset_token.expose_secret().trim().is_empty() {
        return Err(FlowError::Rejected(INVALID_RESET_TOKEN.to_string()));
    }

    client
        .reset_password(reset_token)
        .await
        .map_err(reset_token_error)?;

    form.validate()?;

    let request = ChangePasswordRequest {
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
    };
    client
        .change_password(reset_token, &request)
        .await
        .map_err(reset_token_error)?;

    info!("password changed");
    Ok(paths::SIGN_IN)
}

fn reset_token_error(err: AuthError) -> FlowError {
    match err {
        AuthError::Rejected { .. } | AuthError::Http { .. } => {
            FlowError::Rejected(INVALID_RESET_TOKEN.to_string())
        }
        err => FlowError::Unavailable(err),
    }
}
