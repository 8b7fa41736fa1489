pub mod account;
pub mod oauth;
pub mod session;

// The match over `Action` lives in `run` so this file only declares the shapes.
mod run;

use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

#[derive(Debug)]
pub enum Action {
    Status(GlobalArgs),
    Login(session::LoginArgs),
    Logout(GlobalArgs),
    Register(account::RegisterArgs),
    ForgotPassword(account::ForgotPasswordArgs),
    ResetPassword(account::ResetPasswordArgs),
    Google(oauth::GoogleArgs),
    GithubUrl(oauth::GithubUrlArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}

/// Returns `value`, or prompts on stderr and reads one line from stdin.
pub(crate) fn secret_or_prompt(value: Option<SecretString>, prompt: &str) -> Result<SecretString> {
    if let Some(value) = value {
        return Ok(value);
    }

    let mut stderr = io::stderr();
    write!(stderr, "{prompt}: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("failed to read {prompt} from stdin"))?;
    Ok(SecretString::from(
        line.trim_end_matches(['\r', '\n']).to_string(),
    ))
}
