//! # Kusl Vault (session client)
//!
//! `kusl_vault` tracks whether the current user is signed in to Kusl Vault,
//! keeps the bearer token in a durable client store, and reconciles that local
//! state with the remote Auth API on startup and on demand.
//!
//! ## Session lifecycle
//!
//! A [`session::SessionManager`] is constructed once by the root that owns it
//! and starts out `Unknown` with `loading` set. The first reconciliation reads
//! the stored token, asks the Auth API to verify it, falls back to a refresh
//! through the out-of-band refresh cookie, and settles on `Authenticated` or
//! `Unauthenticated`. After that only `login` and `logout` change the state.
//!
//! - **Race guard:** every `login`/`logout` bumps an epoch. A reconciliation
//!   that started under an older epoch discards its result instead of
//!   overwriting a newer decision.
//! - **Logout:** the local clear is unconditional; the remote notification is
//!   best effort and reported separately.
//!
//! ## Forms
//!
//! [`forms`] validates sign-in, sign-up and password-reset input field by field,
//! and [`flows`] wires validation, the Auth API and the session manager into the
//! submit handlers the front end calls.
//!
//! Tokens and passwords are carried as `SecretString` and must never be logged.

pub mod api;
pub mod cli;
pub mod flows;
pub mod forms;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
