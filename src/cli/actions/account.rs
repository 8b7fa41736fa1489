use crate::{
    cli::{
        actions::{secret_or_prompt, session::report},
        globals::GlobalArgs,
    },
    flows,
    forms::{ForgotPasswordForm, ResetPasswordForm, SignUpForm},
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct RegisterArgs {
    pub globals: GlobalArgs,
    pub username: String,
    pub email: String,
    pub password: Option<SecretString>,
    pub confirm_password: Option<SecretString>,
    pub accept_terms: bool,
}

#[derive(Debug)]
pub struct ForgotPasswordArgs {
    pub globals: GlobalArgs,
    pub email: String,
}

#[derive(Debug)]
pub struct ResetPasswordArgs {
    pub globals: GlobalArgs,
    pub token: SecretString,
    pub password: Option<SecretString>,
    pub confirm_password: Option<SecretString>,
}

/// # Errors
/// Returns an error if the form is invalid or the Auth API refuses it.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let session = args.globals.connect()?;
    let form = SignUpForm {
        username: args.username,
        email: args.email,
        password: secret_or_prompt(args.password, "password")?,
        confirm_password: secret_or_prompt(args.confirm_password, "confirm password")?,
        terms_agreement: args.accept_terms,
    };

    let next = flows::sign_up(&session.client, &form)
        .await
        .map_err(report)?;
    println!("account created, sign in at {next}");
    Ok(())
}

/// # Errors
/// Returns an error if the email is invalid or unknown.
pub async fn forgot_password(args: ForgotPasswordArgs) -> Result<()> {
    let session = args.globals.connect()?;
    let form = ForgotPasswordForm { email: args.email };

    match flows::forgot_password(&session.client, &form)
        .await
        .map_err(report)?
    {
        Some(tracking) => println!("reset email sent ({tracking})"),
        None => println!("reset email sent"),
    }
    Ok(())
}

/// # Errors
/// Returns an error if the token is invalid or the new password is refused.
pub async fn reset_password(args: ResetPasswordArgs) -> Result<()> {
    let session = args.globals.connect()?;
    let form = ResetPasswordForm {
        password: secret_or_prompt(args.password, "new password")?,
        confirm_password: secret_or_prompt(args.confirm_password, "confirm password")?,
    };

    let next = flows::reset_password(&session.client, &args.token, &form)
        .await
        .map_err(report)?;
    println!("password changed, sign in at {next}");
    Ok(())
}
