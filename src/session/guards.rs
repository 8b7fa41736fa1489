use super::SessionState;
use tokio::sync::watch;

pub mod paths {
    pub const HOME: &str = "/";
    pub const SIGN_IN: &str = "/signin";
}

/// Navigation gate in front of a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    /// Only for signed-in users; everyone else goes to sign-in.
    Protected,
    /// Sign-in, sign-up and password pages; signed-in users go home.
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still loading; render neither the page nor a redirect.
    Defer,
    Render,
    Redirect(&'static str),
}

impl RouteGuard {
    /// Decides from a single snapshot. UX only; real access control lives on the API.
    #[must_use]
    pub const fn decide(self, state: &SessionState) -> GuardDecision {
        if state.loading() {
            return GuardDecision::Defer;
        }

        match (self, state.is_authenticated()) {
            (Self::Protected, false) => GuardDecision::Redirect(paths::SIGN_IN),
            (Self::Public, true) => GuardDecision::Redirect(paths::HOME),
            _ => GuardDecision::Render,
        }
    }

    /// Waits until the first reconciliation settles, then decides.
    ///
    /// If the session manager is dropped first, the guard decides as if the
    /// user were signed out.
    pub async fn settle(self, session: &mut watch::Receiver<SessionState>) -> GuardDecision {
        match session.wait_for(|state| !state.loading()).await {
            Ok(state) => self.decide(&state),
            Err(_) => self.decide(&SessionState::unauthenticated(false)),
        }
    }
}
