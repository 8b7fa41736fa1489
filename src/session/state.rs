use secrecy::SecretString;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    /// Startup state, before the first reconciliation settles.
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        };
        f.write_str(label)
    }
}

/// Snapshot of the session as published to subscribers.
///
/// `Authenticated` always carries a credential; the constructors are the only
/// way to build a state, so the pair cannot drift apart.
#[derive(Clone)]
pub struct SessionState {
    status: AuthStatus,
    loading: bool,
    credential: Option<SecretString>,
}

impl SessionState {
    pub(crate) const fn initial() -> Self {
        Self {
            status: AuthStatus::Unknown,
            loading: true,
            credential: None,
        }
    }

    pub(crate) const fn authenticated(credential: SecretString, loading: bool) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            loading,
            credential: Some(credential),
        }
    }

    pub(crate) const fn unauthenticated(loading: bool) -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            loading,
            credential: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        self.status
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated)
    }

    /// True until the first reconciliation settles.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }

    pub(crate) fn take_credential(&mut self) -> Option<SecretString> {
        self.credential.take()
    }

    pub(crate) fn finish_loading(&mut self) -> bool {
        let was_loading = self.loading;
        self.loading = false;
        if self.status == AuthStatus::Unknown {
            self.status = AuthStatus::Unauthenticated;
            self.credential = None;
        }
        was_loading
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("status", &self.status)
            .field("loading", &self.loading)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .finish()
    }
}
