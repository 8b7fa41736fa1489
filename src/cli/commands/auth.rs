//! Subcommands that talk to the Auth API.

use clap::{Arg, ArgAction, Command};

pub const CMD_STATUS: &str = "status";
pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_REGISTER: &str = "register";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";
pub const CMD_GOOGLE: &str = "google";
pub const CMD_GITHUB_URL: &str = "github-url";

pub const ARG_USERNAME: &str = "username";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_REMEMBER: &str = "remember";
pub const ARG_ACCEPT_TERMS: &str = "accept-terms";
pub const ARG_TOKEN: &str = "token";
pub const ARG_GITHUB_CLIENT_ID: &str = "github-client-id";
pub const ARG_GITHUB_REDIRECT_URI: &str = "github-redirect-uri";

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Password; read from stdin when omitted")
        .env("KUSL_PASSWORD")
        .hide_env_values(true)
}

fn confirm_password_arg() -> Arg {
    Arg::new(ARG_CONFIRM_PASSWORD)
        .long(ARG_CONFIRM_PASSWORD)
        .help("Password confirmation; read from stdin when omitted")
        .hide_env_values(true)
}

fn remember_arg() -> Arg {
    Arg::new(ARG_REMEMBER)
        .long(ARG_REMEMBER)
        .help("Keep the session beyond the browser lifetime")
        .action(ArgAction::SetTrue)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_STATUS)
                .about("Reconcile the stored session with the Auth API and print the result"),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in with username or email and password")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Username or email")
                        .env("KUSL_USERNAME")
                        .required(true),
                )
                .arg(password_arg())
                .arg(remember_arg()),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("End the session locally and on the Auth API"))
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Username, 6 to 50 characters")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Email address")
                        .required(true),
                )
                .arg(password_arg())
                .arg(confirm_password_arg())
                .arg(
                    Arg::new(ARG_ACCEPT_TERMS)
                        .long(ARG_ACCEPT_TERMS)
                        .help("Accept the Terms of Service and Privacy Policy")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(CMD_FORGOT_PASSWORD)
                .about("Request a password reset email")
                .arg(
                    Arg::new(ARG_EMAIL)
                        .short('e')
                        .long(ARG_EMAIL)
                        .help("Email address of the account")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Set a new password with the token from the reset email")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .long(ARG_TOKEN)
                        .help("Reset token from the email link")
                        .env("KUSL_RESET_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(password_arg())
                .arg(confirm_password_arg()),
        )
        .subcommand(
            Command::new(CMD_GOOGLE)
                .about("Sign in with a Google access token")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .long(ARG_TOKEN)
                        .help("Google OAuth access token")
                        .env("KUSL_GOOGLE_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(remember_arg()),
        )
        .subcommand(
            Command::new(CMD_GITHUB_URL)
                .about("Print the GitHub authorize URL to open in a browser")
                .arg(
                    Arg::new(ARG_GITHUB_CLIENT_ID)
                        .long(ARG_GITHUB_CLIENT_ID)
                        .help("GitHub OAuth app client id")
                        .env("KUSL_GITHUB_CLIENT_ID")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_GITHUB_REDIRECT_URI)
                        .long(ARG_GITHUB_REDIRECT_URI)
                        .help("Callback URL registered with the GitHub app")
                        .env("KUSL_GITHUB_REDIRECT_URI")
                        .required(true),
                )
                .arg(remember_arg()),
        )
}
