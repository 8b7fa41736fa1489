//! Maps parsed arguments to an [`Action`].

use crate::{
    cli::{
        actions::{account, oauth, session, Action},
        commands::{auth, ARG_API_URL, ARG_STORE_PATH, ARG_TIMEOUT},
        globals::GlobalArgs,
    },
    flows::GithubOAuth,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;
    let globals = global_args(matches)?;

    let action = match name {
        auth::CMD_STATUS => Action::Status(globals),
        auth::CMD_LOGOUT => Action::Logout(globals),
        auth::CMD_LOGIN => Action::Login(session::LoginArgs {
            globals,
            username: required(sub, auth::ARG_USERNAME)?,
            password: secret(sub, auth::ARG_PASSWORD),
            remember: sub.get_flag(auth::ARG_REMEMBER),
        }),
        auth::CMD_REGISTER => Action::Register(account::RegisterArgs {
            globals,
            username: required(sub, auth::ARG_USERNAME)?,
            email: required(sub, auth::ARG_EMAIL)?,
            password: secret(sub, auth::ARG_PASSWORD),
            confirm_password: secret(sub, auth::ARG_CONFIRM_PASSWORD),
            accept_terms: sub.get_flag(auth::ARG_ACCEPT_TERMS),
        }),
        auth::CMD_FORGOT_PASSWORD => Action::ForgotPassword(account::ForgotPasswordArgs {
            globals,
            email: required(sub, auth::ARG_EMAIL)?,
        }),
        auth::CMD_RESET_PASSWORD => Action::ResetPassword(account::ResetPasswordArgs {
            globals,
            token: secret(sub, auth::ARG_TOKEN).context("missing required argument: --token")?,
            password: secret(sub, auth::ARG_PASSWORD),
            confirm_password: secret(sub, auth::ARG_CONFIRM_PASSWORD),
        }),
        auth::CMD_GOOGLE => Action::Google(oauth::GoogleArgs {
            globals,
            token: secret(sub, auth::ARG_TOKEN).context("missing required argument: --token")?,
            remember: sub.get_flag(auth::ARG_REMEMBER),
        }),
        auth::CMD_GITHUB_URL => Action::GithubUrl(oauth::GithubUrlArgs {
            github: GithubOAuth {
                client_id: required(sub, auth::ARG_GITHUB_CLIENT_ID)?,
                redirect_uri: required(sub, auth::ARG_GITHUB_REDIRECT_URI)?,
            },
            remember: sub.get_flag(auth::ARG_REMEMBER),
        }),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}

fn global_args(matches: &ArgMatches) -> Result<GlobalArgs> {
    let api_url = required(matches, ARG_API_URL)?;
    let store_path = matches.get_one::<PathBuf>(ARG_STORE_PATH).cloned();
    let timeout = matches
        .get_one::<u64>(ARG_TIMEOUT)
        .copied()
        .map_or(crate::api::DEFAULT_TIMEOUT, Duration::from_secs);

    Ok(GlobalArgs::new(api_url, store_path, timeout))
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Option<SecretString> {
    matches
        .get_one::<String>(id)
        .map(|value| SecretString::from(value.clone()))
}
