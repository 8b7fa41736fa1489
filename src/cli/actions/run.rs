use crate::cli::actions::{account, oauth, session, Action};
use anyhow::Result;

/// Single dispatch point for every CLI action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Status(globals) => session::status(globals).await,
        Action::Login(args) => session::login(args).await,
        Action::Logout(globals) => session::logout(globals).await,
        Action::Register(args) => account::register(args).await,
        Action::ForgotPassword(args) => account::forgot_password(args).await,
        Action::ResetPassword(args) => account::reset_password(args).await,
        Action::Google(args) => oauth::google(args).await,
        Action::GithubUrl(args) => oauth::github_url(&args),
    }
}
