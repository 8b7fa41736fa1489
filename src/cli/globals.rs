use crate::{
    api::AuthClient,
    session::SessionManager,
    store::{ClientStore, FileStore, REFRESH_COOKIE_KEY},
};
use anyhow::{Context, Result};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, warn};

const STORE_DIR: &str = ".kusl-vault";
const STORE_FILE: &str = "session.json";

/// Settings shared by every subcommand.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub api_url: String,
    pub store_path: PathBuf,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, store_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            api_url,
            store_path: store_path.unwrap_or_else(default_store_path),
            timeout,
        }
    }

    /// Builds the API client and the session manager over the session file,
    /// and reloads the refresh cookie saved by the previous run.
    ///
    /// # Errors
    /// Returns an error if the API URL is unusable.
    pub fn connect(&self) -> Result<Session> {
        let client = AuthClient::new(&self.api_url, self.timeout)
            .with_context(|| format!("invalid API URL: {}", self.api_url))?;

        let store = FileStore::new(&self.store_path);
        match store.get(REFRESH_COOKIE_KEY) {
            Ok(Some(cookies)) => client.restore_refresh_cookies(&cookies),
            Ok(None) => debug!("no saved refresh cookie"),
            Err(err) => warn!("saved refresh cookie unreadable: {err}"),
        }

        let manager = SessionManager::new(client.clone(), store);
        Ok(Session { client, manager })
    }
}

/// The root-owned session context for one CLI invocation.
#[derive(Debug)]
pub struct Session {
    pub client: AuthClient,
    pub manager: SessionManager<AuthClient, FileStore>,
}

impl Session {
    /// Saves the refresh cookie so the next run can reconcile through it.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn save_refresh_cookie(&self) -> Result<()> {
        let store = self.manager.store();
        let saved = match self.client.refresh_cookies() {
            Some(cookies) => store.set(REFRESH_COOKIE_KEY, &cookies),
            None => store.remove(REFRESH_COOKIE_KEY),
        };
        saved.with_context(|| format!("failed to update {}", store.path().display()))
    }

    /// Drops the saved refresh cookie.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn forget_refresh_cookie(&self) -> Result<()> {
        let store = self.manager.store();
        store
            .remove(REFRESH_COOKIE_KEY)
            .with_context(|| format!("failed to update {}", store.path().display()))
    }
}

fn default_store_path() -> PathBuf {
    store_path_under(std::env::var_os("HOME").map(PathBuf::from).as_deref())
}

fn store_path_under(home: Option<&Path>) -> PathBuf {
    home.unwrap_or_else(|| Path::new("."))
        .join(STORE_DIR)
        .join(STORE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ACCESS_TOKEN_KEY;

    #[test]
    fn test_default_store_path() {
        assert_eq!(
            store_path_under(Some(Path::new("/home/kusl"))),
            PathBuf::from("/home/kusl/.kusl-vault/session.json")
        );
        assert_eq!(
            store_path_under(None),
            PathBuf::from("./.kusl-vault/session.json")
        );
    }

    #[test]
    fn test_default_store_path_follows_home() {
        temp_env::with_var("HOME", Some("/srv/kusl"), || {
            let args = GlobalArgs::new(
                "http://localhost:8080/api".to_string(),
                None,
                Duration::from_secs(10),
            );
            assert_eq!(
                args.store_path,
                PathBuf::from("/srv/kusl/.kusl-vault/session.json")
            );
        });
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let args = GlobalArgs::new(
            "not a url".to_string(),
            Some(PathBuf::from("/tmp/unused.json")),
            Duration::from_secs(1),
        );
        let err = args.connect().err().map(|err| err.to_string());
        assert_eq!(err.as_deref(), Some("invalid API URL: not a url"));
    }

    #[test]
    fn test_refresh_cookie_round_trips_through_the_session_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("session.json");
        let args = GlobalArgs::new(
            "https://vault.kusl.dev/api".to_string(),
            Some(path.clone()),
            Duration::from_secs(1),
        );

        let session = args.connect()?;
        session
            .client
            .restore_refresh_cookies("refreshToken=r-123");
        session.save_refresh_cookie()?;

        let reopened = args.connect()?;
        assert_eq!(
            reopened.client.refresh_cookies().as_deref(),
            Some("refreshToken=r-123")
        );
        assert_eq!(reopened.manager.store().get(ACCESS_TOKEN_KEY)?, None);

        reopened.forget_refresh_cookie()?;
        assert_eq!(FileStore::new(&path).get(REFRESH_COOKIE_KEY)?, None);
        Ok(())
    }
}
