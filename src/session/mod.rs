//! Session state and lifecycle. The manager is owned by the front end's root,
//! reconciles the stored bearer token with the Auth API once at startup and
//! publishes every change through a `watch` channel. Only non-sensitive status
//! is logged; the credential never appears in events or `Debug` output.

mod guards;
mod state;

#[cfg(test)]
mod tests;

pub use self::guards::{paths, GuardDecision, RouteGuard};
pub use self::state::{AuthStatus, SessionState};

use crate::{
    api::{AuthApi, AuthError},
    store::{ClientStore, StoreError, ACCESS_TOKEN_KEY, AUTH_FLAG_KEY},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Result of the startup reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The stored token was accepted by `verify`.
    Verified,
    /// A new token was obtained through `refresh`.
    Refreshed,
    /// Neither step produced a session; stored credentials were cleared.
    Unauthenticated(FailureCause),
    /// A `login` or `logout` ran while the calls were in flight; the stale
    /// result was dropped.
    Superseded,
    /// Reconciliation already ran for this manager; nothing was called.
    AlreadySettled(AuthStatus),
}

/// Why the last step of a reconciliation failed. Both causes lead to the same
/// `Unauthenticated` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The API answered and refused.
    Rejected,
    /// The API could not be reached or timed out.
    Unreachable,
}

/// Outcome of a logout. The local part always happens; the remote
/// notification has its own, independent result.
#[derive(Debug)]
pub struct LogoutReport {
    pub store: Result<(), StoreError>,
    pub remote: Result<(), AuthError>,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("refusing to record a blank credential")]
    BlankCredential,
    #[error(transparent)]
    Store(#[from] StoreError),
}

enum Resolution {
    Verified(SecretString),
    Refreshed(SecretString),
    Failed(FailureCause),
}

pub struct SessionManager<A, S> {
    api: A,
    store: S,
    state: watch::Sender<SessionState>,
    // bumped by login/logout so a reconciliation can tell it was overtaken
    epoch: AtomicU64,
    reconciled: AtomicBool,
}

impl<A, S> std::fmt::Debug for SessionManager<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<A: AuthApi, S: ClientStore> SessionManager<A, S> {
    /// Creates the manager in the `Unknown`/loading state. Nothing is read or
    /// called until [`SessionManager::initialize`] runs.
    pub fn new(api: A, store: S) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            api,
            store,
            state,
            epoch: AtomicU64::new(0),
            reconciled: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading()
    }

    /// Runs the startup reconciliation: verify the stored token, fall back to
    /// refresh, and settle on `Authenticated` or `Unauthenticated`.
    ///
    /// Runs at most once per manager. `loading` is cleared on every exit path,
    /// including when this future is dropped before completion.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> ReconcileOutcome {
        if self.reconciled.swap(true, Ordering::SeqCst) {
            let status = self.state.borrow().status();
            debug!("reconciliation already ran, status: {status}");
            return ReconcileOutcome::AlreadySettled(status);
        }

        let _loading = LoadingGuard(&self.state);
        let started = self.epoch.load(Ordering::SeqCst);

        let resolution = self.reconcile().await;
        let outcome = self.apply(started, resolution);

        info!("session reconciled: {outcome:?}");
        outcome
    }

    /// Records a credential obtained by a successful login or OAuth exchange.
    /// Makes no network call.
    ///
    /// # Errors
    /// Returns `BlankCredential` without touching the session if the token is
    /// empty. Returns `Store` if the token cannot be persisted; the in-memory
    /// state is updated regardless.
    pub fn login(&self, credential: SecretString) -> Result<(), LoginError> {
        if credential.expose_secret().trim().is_empty() {
            warn!("ignoring login with a blank credential");
            return Err(LoginError::BlankCredential);
        }

        let mut persisted = Ok(());
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            persisted = self.persist(&credential);
            *state = SessionState::authenticated(credential, state.loading());
        });

        if let Err(err) = &persisted {
            warn!("session token not persisted: {err}");
        }
        Ok(persisted?)
    }

    /// Clears the session locally, then notifies the Auth API.
    ///
    /// The local clear never waits on, or depends on, the remote answer.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> LogoutReport {
        let mut credential = None;
        let mut store = Ok(());
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            credential = state.take_credential().or_else(|| self.stored_credential());
            store = self.forget();
            *state = SessionState::unauthenticated(state.loading());
        });

        if let Err(err) = &store {
            warn!("stored session not cleared: {err}");
        }

        let remote = self.api.logout(credential.as_ref()).await;
        match &remote {
            Ok(()) => debug!("remote logout acknowledged"),
            Err(err) => warn!("remote logout failed: {err}"),
        }

        LogoutReport { store, remote }
    }

    /// Decides the session from the stored token and the Auth API. Does not
    /// touch the published state.
    async fn reconcile(&self) -> Resolution {
        if let Some(token) = self.stored_credential() {
            match self.api.verify(&token).await {
                Ok(()) => return Resolution::Verified(token),
                Err(err) => debug!("stored token not accepted: {err}"),
            }
        } else {
            debug!("no stored token");
        }

        match self.api.refresh().await {
            Ok(token) => Resolution::Refreshed(token),
            Err(err) => {
                debug!("refresh failed: {err}");
                if err.is_transport() {
                    Resolution::Failed(FailureCause::Unreachable)
                } else {
                    Resolution::Failed(FailureCause::Rejected)
                }
            }
        }
    }

    fn apply(&self, started: u64, resolution: Resolution) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::Superseded;
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != started {
                debug!("discarding reconciliation result, session changed meanwhile");
                return false;
            }

            match resolution {
                Resolution::Verified(token) => {
                    if let Err(err) = self.store.set(AUTH_FLAG_KEY, "true") {
                        warn!("session flag not persisted: {err}");
                    }
                    *state = SessionState::authenticated(token, false);
                    outcome = ReconcileOutcome::Verified;
                }
                Resolution::Refreshed(token) => {
                    if let Err(err) = self.persist(&token) {
                        warn!("refreshed token not persisted: {err}");
                    }
                    *state = SessionState::authenticated(token, false);
                    outcome = ReconcileOutcome::Refreshed;
                }
                Resolution::Failed(cause) => {
                    if let Err(err) = self.forget() {
                        warn!("stored session not cleared: {err}");
                    }
                    *state = SessionState::unauthenticated(false);
                    outcome = ReconcileOutcome::Unauthenticated(cause);
                }
            }
            true
        });
        outcome
    }

    fn stored_credential(&self) -> Option<SecretString> {
        match self.store.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token
                .filter(|token| !token.trim().is_empty())
                .map(SecretString::from),
            Err(err) => {
                warn!("stored token unreadable: {err}");
                None
            }
        }
    }

    fn persist(&self, token: &SecretString) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, token.expose_secret())?;
        self.store.set(AUTH_FLAG_KEY, "true")
    }

    fn forget(&self) -> Result<(), StoreError> {
        let token = self.store.remove(ACCESS_TOKEN_KEY);
        let flag = self.store.remove(AUTH_FLAG_KEY);
        token.and(flag)
    }
}

/// Clears `loading` when dropped, whether reconciliation finished, failed or
/// was cancelled mid-flight.
struct LoadingGuard<'a>(&'a watch::Sender<SessionState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(SessionState::finish_loading);
    }
}
