use super::*;
use crate::store::MemoryStore;
use anyhow::{anyhow, Result};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{sync::Notify, time::timeout};

#[derive(Clone, Copy)]
enum Reply {
    Accept,
    Reject,
    Unreachable,
}

impl Reply {
    fn result(self) -> Result<(), AuthError> {
        match self {
            Self::Accept => Ok(()),
            Self::Reject => Err(AuthError::Rejected {
                code: crate::api::error::STATUS_INVALID_TOKEN,
                message: "Token is invalid".to_string(),
            }),
            Self::Unreachable => Err(AuthError::Transport("connection refused".to_string())),
        }
    }
}

/// Scripted Auth API. `verify` can be held open until the test releases it.
struct FakeApi {
    verify: Reply,
    refresh: Reply,
    logout: Reply,
    verify_entered: Arc<Notify>,
    verify_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn new(verify: Reply, refresh: Reply) -> Self {
        Self {
            verify,
            refresh,
            logout: Reply::Accept,
            verify_entered: Arc::new(Notify::new()),
            verify_gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_logout(mut self, logout: Reply) -> Self {
        self.logout = logout;
        self
    }

    fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.verify_gate = Some(Arc::clone(gate));
        self
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl AuthApi for FakeApi {
    async fn verify(&self, token: &SecretString) -> Result<(), AuthError> {
        self.record(format!("verify:{}", token.expose_secret()));
        self.verify_entered.notify_one();
        if let Some(gate) = &self.verify_gate {
            gate.notified().await;
        }
        self.verify.result()
    }

    async fn refresh(&self) -> Result<SecretString, AuthError> {
        self.record("refresh".to_string());
        self.refresh
            .result()
            .map(|()| SecretString::from("refreshed-token".to_string()))
    }

    async fn logout(&self, token: Option<&SecretString>) -> Result<(), AuthError> {
        let token = token.map_or("-", |token| token.expose_secret());
        self.record(format!("logout:{token}"));
        self.logout.result()
    }
}

fn store_with_token(token: &str) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    store.set(ACCESS_TOKEN_KEY, token)?;
    Ok(store)
}

fn credential_of(state: &SessionState) -> Option<String> {
    state
        .credential()
        .map(|token| token.expose_secret().to_string())
}

#[tokio::test]
async fn valid_stored_token_is_verified() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject),
        store_with_token("stored-token")?,
    );
    assert!(session.is_loading());

    let outcome = session.initialize().await;

    assert_eq!(outcome, ReconcileOutcome::Verified);
    let state = session.snapshot();
    assert!(state.is_authenticated());
    assert!(!state.loading());
    assert_eq!(credential_of(&state).as_deref(), Some("stored-token"));
    assert_eq!(
        session.store().get(ACCESS_TOKEN_KEY)?.as_deref(),
        Some("stored-token")
    );
    assert_eq!(session.api().calls(), vec!["verify:stored-token"]);
    Ok(())
}

#[tokio::test]
async fn expired_token_falls_back_to_refresh() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Accept),
        store_with_token("expired-token")?,
    );

    let outcome = session.initialize().await;

    assert_eq!(outcome, ReconcileOutcome::Refreshed);
    assert!(session.is_authenticated());
    assert_eq!(
        credential_of(&session.snapshot()).as_deref(),
        Some("refreshed-token")
    );
    assert_eq!(
        session.store().get(ACCESS_TOKEN_KEY)?.as_deref(),
        Some("refreshed-token")
    );
    assert_eq!(session.store().get(AUTH_FLAG_KEY)?.as_deref(), Some("true"));
    assert_eq!(
        session.api().calls(),
        vec!["verify:expired-token", "refresh"]
    );
    Ok(())
}

#[tokio::test]
async fn no_token_and_failed_refresh_ends_unauthenticated() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject),
        MemoryStore::new(),
    );

    let outcome = session.initialize().await;

    assert_eq!(
        outcome,
        ReconcileOutcome::Unauthenticated(FailureCause::Rejected)
    );
    let state = session.snapshot();
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert!(!state.loading());
    assert!(state.credential().is_none());
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    assert_eq!(session.api().calls(), vec!["refresh"]);
    Ok(())
}

#[tokio::test]
async fn outage_is_treated_like_an_invalid_token() -> Result<()> {
    let store = store_with_token("stored-token")?;
    store.set(AUTH_FLAG_KEY, "true")?;
    let session = SessionManager::new(
        FakeApi::new(Reply::Unreachable, Reply::Unreachable),
        store,
    );

    let outcome = session.initialize().await;

    assert_eq!(
        outcome,
        ReconcileOutcome::Unauthenticated(FailureCause::Unreachable)
    );
    assert!(!session.is_authenticated());
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    assert_eq!(session.store().get(AUTH_FLAG_KEY)?, None);
    Ok(())
}

#[tokio::test]
async fn failure_cause_comes_from_the_refresh_call() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Unreachable, Reply::Reject),
        store_with_token("stored-token")?,
    );
    assert_eq!(
        session.initialize().await,
        ReconcileOutcome::Unauthenticated(FailureCause::Rejected)
    );
    assert_eq!(
        session.api().calls(),
        vec!["verify:stored-token", "refresh"]
    );

    let session = SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Unreachable),
        store_with_token("stored-token")?,
    );
    assert_eq!(
        session.initialize().await,
        ReconcileOutcome::Unauthenticated(FailureCause::Unreachable)
    );
    Ok(())
}

#[tokio::test]
async fn blank_stored_token_skips_verify() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Accept),
        store_with_token("   ")?,
    );

    assert_eq!(session.initialize().await, ReconcileOutcome::Refreshed);
    assert_eq!(session.api().calls(), vec!["refresh"]);
    Ok(())
}

#[tokio::test]
async fn initialize_runs_once() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject),
        store_with_token("stored-token")?,
    );

    session.initialize().await;
    let again = session.initialize().await;

    assert_eq!(
        again,
        ReconcileOutcome::AlreadySettled(AuthStatus::Authenticated)
    );
    assert!(!session.is_loading());
    assert_eq!(session.api().calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn login_twice_matches_login_once() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Reject),
        MemoryStore::new(),
    );
    session.initialize().await;

    session.login(SecretString::from("token-1".to_string()))?;
    let once = session.snapshot();
    session.login(SecretString::from("token-1".to_string()))?;
    let twice = session.snapshot();

    assert!(twice.is_authenticated());
    assert_eq!(once.status(), twice.status());
    assert_eq!(once.loading(), twice.loading());
    assert_eq!(credential_of(&once), credential_of(&twice));
    assert_eq!(
        session.store().get(ACCESS_TOKEN_KEY)?.as_deref(),
        Some("token-1")
    );
    assert_eq!(session.store().get(AUTH_FLAG_KEY)?.as_deref(), Some("true"));
    Ok(())
}

#[tokio::test]
async fn blank_credential_is_refused() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Reject),
        MemoryStore::new(),
    );
    session.initialize().await;

    for blank in ["", "   "] {
        let refused = session.login(SecretString::from(blank.to_string()));
        assert!(matches!(refused, Err(LoginError::BlankCredential)));
    }

    let state = session.snapshot();
    assert!(!state.is_authenticated());
    assert_eq!(credential_of(&state), None);
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    assert_eq!(session.store().get(AUTH_FLAG_KEY)?, None);
    Ok(())
}

#[tokio::test]
async fn login_makes_no_network_call() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Accept),
        MemoryStore::new(),
    );

    session.login(SecretString::from("token-1".to_string()))?;

    assert!(session.is_authenticated());
    // reconciliation has not run, so loading is still pending
    assert!(session.is_loading());
    assert!(session.api().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn logout_clears_state_when_remote_fails() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject).with_logout(Reply::Unreachable),
        store_with_token("stored-token")?,
    );
    session.initialize().await;
    assert!(session.is_authenticated());

    let report = session.logout().await;

    assert!(report.store.is_ok());
    assert!(matches!(report.remote, Err(AuthError::Transport(_))));
    let state = session.snapshot();
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert!(state.credential().is_none());
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    assert_eq!(session.store().get(AUTH_FLAG_KEY)?, None);
    assert!(session
        .api()
        .calls()
        .contains(&"logout:stored-token".to_string()));
    Ok(())
}

#[tokio::test]
async fn logout_before_initialize_uses_the_stored_token() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Accept),
        store_with_token("stored-token")?,
    );

    let report = session.logout().await;

    assert!(report.remote.is_ok());
    assert_eq!(session.api().calls(), vec!["logout:stored-token"]);
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    Ok(())
}

#[tokio::test]
async fn subscribers_see_the_settled_state() -> Result<()> {
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject),
        store_with_token("stored-token")?,
    );
    let mut rx = session.subscribe();
    assert!(rx.borrow_and_update().loading());

    session.initialize().await;

    assert!(rx.has_changed()?);
    let state = rx.borrow_and_update().clone();
    assert!(state.is_authenticated());
    assert!(!state.loading());
    Ok(())
}

#[tokio::test]
async fn guards_defer_until_reconciliation_settles() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Reject).gated(&gate),
        store_with_token("stored-token")?,
    ));

    let running = Arc::clone(&session);
    let handle = tokio::spawn(async move { running.initialize().await });
    session.api().verify_entered.notified().await;

    let state = session.snapshot();
    assert_eq!(RouteGuard::Protected.decide(&state), GuardDecision::Defer);
    assert_eq!(RouteGuard::Public.decide(&state), GuardDecision::Defer);

    // no navigation may happen while verify is outstanding
    let mut rx = session.subscribe();
    let early = timeout(
        Duration::from_millis(50),
        RouteGuard::Protected.settle(&mut rx),
    )
    .await;
    assert!(early.is_err());

    gate.notify_one();
    handle.await?;

    assert_eq!(
        RouteGuard::Protected.settle(&mut rx).await,
        GuardDecision::Redirect(paths::SIGN_IN)
    );
    let mut rx = session.subscribe();
    assert_eq!(
        RouteGuard::Public.settle(&mut rx).await,
        GuardDecision::Render
    );
    Ok(())
}

// Logout while verify is in flight: the epoch guard drops the late verify
// result, so the user stays signed out.
#[tokio::test]
async fn logout_during_verify_wins_over_late_success() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Reject).gated(&gate),
        store_with_token("stored-token")?,
    ));

    let running = Arc::clone(&session);
    let handle = tokio::spawn(async move { running.initialize().await });
    session.api().verify_entered.notified().await;

    session.logout().await;
    gate.notify_one();
    let outcome = handle.await?;

    assert_eq!(outcome, ReconcileOutcome::Superseded);
    let state = session.snapshot();
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    assert!(!state.loading());
    assert!(state.credential().is_none());
    assert_eq!(session.store().get(ACCESS_TOKEN_KEY)?, None);
    Ok(())
}

#[tokio::test]
async fn login_during_reconciliation_is_not_overwritten() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let session = Arc::new(SessionManager::new(
        FakeApi::new(Reply::Reject, Reply::Reject).gated(&gate),
        store_with_token("stale-token")?,
    ));

    let running = Arc::clone(&session);
    let handle = tokio::spawn(async move { running.initialize().await });
    session.api().verify_entered.notified().await;

    session.login(SecretString::from("fresh-token".to_string()))?;
    gate.notify_one();
    let outcome = handle.await?;

    assert_eq!(outcome, ReconcileOutcome::Superseded);
    let state = session.snapshot();
    assert!(state.is_authenticated());
    assert!(!state.loading());
    assert_eq!(credential_of(&state).as_deref(), Some("fresh-token"));
    assert_eq!(
        session.store().get(ACCESS_TOKEN_KEY)?.as_deref(),
        Some("fresh-token")
    );
    Ok(())
}

#[tokio::test]
async fn cancelled_reconciliation_still_clears_loading() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let session = SessionManager::new(
        FakeApi::new(Reply::Accept, Reply::Accept).gated(&gate),
        store_with_token("stored-token")?,
    );

    let cancelled = timeout(Duration::from_millis(20), session.initialize()).await;
    if cancelled.is_ok() {
        return Err(anyhow!("verify should still be held open"));
    }

    let state = session.snapshot();
    assert!(!state.loading());
    assert_eq!(state.status(), AuthStatus::Unauthenticated);
    // a cancelled run proves nothing about the token, so it stays stored
    assert_eq!(
        session.store().get(ACCESS_TOKEN_KEY)?.as_deref(),
        Some("stored-token")
    );
    Ok(())
}
