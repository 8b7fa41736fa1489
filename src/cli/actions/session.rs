use crate::{
    cli::{actions::secret_or_prompt, globals::GlobalArgs},
    flows::{self, FlowError},
    forms::SignInForm,
    session::{AuthStatus, FailureCause, GuardDecision, ReconcileOutcome, RouteGuard},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::warn;

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub username: String,
    pub password: Option<SecretString>,
    pub remember: bool,
}

/// Reconciles the saved session and prints where it settled.
/// # Errors
/// Returns an error if the session file cannot be updated.
pub async fn status(globals: GlobalArgs) -> Result<()> {
    let session = globals.connect()?;
    let outcome = session.manager.initialize().await;
    session.save_refresh_cookie()?;

    println!("{}", describe(outcome, session.manager.snapshot().status()));
    Ok(())
}

/// Signs in unless the saved session is still good.
/// # Errors
/// Returns an error if sign-in fails or the session cannot be saved.
pub async fn login(args: LoginArgs) -> Result<()> {
    let session = args.globals.connect()?;
    session.manager.initialize().await;

    let mut updates = session.manager.subscribe();
    if let GuardDecision::Redirect(_) = RouteGuard::Public.settle(&mut updates).await {
        println!("already signed in");
        return Ok(());
    }

    let form = SignInForm {
        username: args.username,
        password: secret_or_prompt(args.password, "password")?,
        remember: args.remember,
    };

    let next = flows::sign_in(&session.client, &session.manager, &form).await;
    // a failed attempt can still rotate cookies; keep the jar in sync either way
    session.save_refresh_cookie()?;
    let next = next.map_err(report)?;

    println!("signed in, continue at {next}");
    Ok(())
}

/// Clears the local session first, then tells the Auth API.
/// # Errors
/// Returns an error only if the local session could not be cleared.
pub async fn logout(globals: GlobalArgs) -> Result<()> {
    let session = globals.connect()?;
    let report = session.manager.logout().await;

    let cookie = session.forget_refresh_cookie();
    report.store.context("failed to clear the saved session")?;
    cookie?;

    if let Err(err) = report.remote {
        warn!("logout not acknowledged: {err}");
        eprintln!("signed out locally; the Auth API could not be notified");
    }
    println!("signed out");
    Ok(())
}

pub(crate) fn report(err: FlowError) -> anyhow::Error {
    match err {
        FlowError::Invalid(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|error| format!("  {}: {}", error.field, error.message))
                .collect();
            anyhow::anyhow!("invalid input:\n{}", lines.join("\n"))
        }
        err => anyhow::Error::new(err),
    }
}

fn describe(outcome: ReconcileOutcome, status: AuthStatus) -> String {
    match outcome {
        ReconcileOutcome::Verified => format!("{status} (stored token verified)"),
        ReconcileOutcome::Refreshed => format!("{status} (token refreshed)"),
        ReconcileOutcome::Unauthenticated(FailureCause::Unreachable) => {
            format!("{status} (Auth API unreachable)")
        }
        ReconcileOutcome::Unauthenticated(FailureCause::Rejected)
        | ReconcileOutcome::Superseded
        | ReconcileOutcome::AlreadySettled(_) => status.to_string(),
    }
}
