use crate::{
    cli::{actions::session::report, globals::GlobalArgs},
    flows::{self, GithubOAuth},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct GoogleArgs {
    pub globals: GlobalArgs,
    pub token: SecretString,
    pub remember: bool,
}

#[derive(Debug)]
pub struct GithubUrlArgs {
    pub github: GithubOAuth,
    pub remember: bool,
}

/// Exchanges a Google access token for a session.
/// # Errors
/// Returns an error if the exchange fails or the session cannot be saved.
pub async fn google(args: GoogleArgs) -> Result<()> {
    let session = args.globals.connect()?;
    let next = flows::google_sign_in(&session.client, &session.manager, &args.token, args.remember)
        .await;
    session.save_refresh_cookie()?;
    let next = next.map_err(report)?;

    println!("signed in with Google, continue at {next}");
    Ok(())
}

/// Prints the GitHub authorize URL; the browser completes the flow.
/// # Errors
/// Returns an error if the URL cannot be built.
pub fn github_url(args: &GithubUrlArgs) -> Result<()> {
    let url = flows::github_authorize_url(&args.github, args.remember)
        .context("failed to build the GitHub authorize URL")?;
    println!("{url}");
    Ok(())
}
