use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthError, AuthState},
    models::{Identity, Session},
};

/// LoginError
///
/// Failures of `SessionStore::login` that are not a plain credential rejection.
/// Rejections are reported as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// Username or credential was empty; the collaborator was not consulted.
    #[error("username and password are required")]
    MissingFields,
    /// The collaborator call itself failed.
    #[error("transient authentication failure: {0}")]
    Transient(String),
}

/// SessionStore
///
/// Single source of truth for "who is logged in". The current `Session` lives in
/// a watch channel: `login` and `logout` are the only writers, every other
/// component reads snapshots or subscribes for change notifications.
pub struct SessionStore {
    auth: AuthState,
    state: watch::Sender<Session>,
    // Login attempts currently awaiting the collaborator. Only touched inside
    // `send_modify` so it stays consistent with `Session::is_loading`.
    in_flight: std::sync::atomic::AtomicUsize,
}

/// SessionState
///
/// The shared handle held by the HTTP layer and the background observers.
pub type SessionState = Arc<SessionStore>;

impl SessionStore {
    /// Creates a store with no identity.
    pub fn new(auth: AuthState) -> Self {
        Self {
            auth,
            state: watch::Sender::new(Session::default()),
            in_flight: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// login
    ///
    /// Asks the collaborator to resolve the credentials. `Ok(true)` commits the
    /// identity, `Ok(false)` means the credentials were rejected. Both a rejection
    /// and a collaborator fault leave the session without an identity.
    ///
    /// Concurrent attempts are not serialized: the last one to resolve decides
    /// the committed identity.
    pub async fn login(&self, username: &str, credential: &str) -> Result<bool, LoginError> {
        if username.is_empty() || credential.is_empty() {
            return Err(LoginError::MissingFields);
        }

        let attempt = LoginAttempt::begin(self);
        let outcome = self.auth.authenticate(username, credential).await;

        match outcome {
            Ok(identity) => {
                info!(username = %identity.username, role = ?identity.role, "login succeeded");
                attempt.resolve(Some(identity));
                Ok(true)
            }
            Err(AuthError::InvalidCredentials) => {
                info!(username, "login rejected: invalid credentials");
                attempt.resolve(None);
                Ok(false)
            }
            Err(AuthError::Unavailable(reason)) => {
                warn!(username, %reason, "login failed: authentication collaborator unavailable");
                attempt.resolve(None);
                Err(LoginError::Transient(reason))
            }
        }
    }

    /// logout
    ///
    /// Clears the identity. Always succeeds; a second call is a no-op and does
    /// not wake subscribers.
    pub fn logout(&self) {
        let changed = self.state.send_if_modified(|session| {
            if session.identity.is_none() {
                return false;
            }
            session.identity = None;
            session.authenticated_at = None;
            true
        });
        if changed {
            info!("logged out");
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    /// Snapshot of the full session, loading flag included.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

/// LoginAttempt
///
/// Tracks one in-flight `login`. Dropping it unresolved (the awaiting future was
/// cancelled) still releases its share of the loading flag.
struct LoginAttempt<'a> {
    store: &'a SessionStore,
    resolved: bool,
}

impl<'a> LoginAttempt<'a> {
    fn begin(store: &'a SessionStore) -> Self {
        store.state.send_modify(|session| {
            store.in_flight.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            session.is_loading = true;
        });
        Self {
            store,
            resolved: false,
        }
    }

    fn resolve(mut self, identity: Option<Identity>) {
        self.resolved = true;
        self.store.state.send_modify(|session| {
            session.is_loading = self.release();
            session.authenticated_at = identity.as_ref().map(|_| Utc::now());
            session.identity = identity;
        });
    }

    // Returns whether other attempts are still pending.
    fn release(&self) -> bool {
        let previous = self
            .store
            .in_flight
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        previous > 1
    }
}

impl Drop for LoginAttempt<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        debug!("login attempt dropped before resolution");
        self.store.state.send_modify(|session| {
            session.is_loading = self.release();
        });
    }
}

/// spawn_session_observer
///
/// Background task that subscribes to the store and logs every transition
/// between the unauthenticated and authenticated states. Ends when the store
/// is dropped.
pub fn spawn_session_observer(store: SessionState) -> JoinHandle<()> {
    let mut rx = store.subscribe();
    drop(store);
    tokio::spawn(async move {
        let mut was_authenticated = rx.borrow_and_update().is_authenticated();
        while rx.changed().await.is_ok() {
            let session = rx.borrow_and_update().clone();
            let now_authenticated = session.is_authenticated();
            if now_authenticated != was_authenticated {
                match &session.identity {
                    Some(identity) => info!(
                        username = %identity.username,
                        "session transition: Unauthenticated -> Authenticated"
                    ),
                    None => info!("session transition: Authenticated -> Unauthenticated"),
                }
                was_authenticated = now_authenticated;
            } else {
                debug!(is_loading = session.is_loading, "session updated");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DemoAuthenticator, MockAuthenticator};
    use crate::config::AppConfig;
    use std::time::Duration;

    fn demo_store() -> SessionStore {
        SessionStore::new(Arc::new(DemoAuthenticator::from_config(
            &AppConfig::default(),
        )))
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let store = demo_store();
        assert_eq!(store.current_identity(), None);
        assert!(!store.session().is_loading);
    }

    #[tokio::test]
    async fn test_successful_login_commits_identity() {
        let store = demo_store();
        assert_eq!(store.login("admin", "admin").await, Ok(true));

        let session = store.session();
        assert_eq!(session.identity.unwrap().username, "admin");
        assert!(session.authenticated_at.is_some());
        assert!(!session.is_loading);
    }

    #[tokio::test]
    async fn test_rejected_login_resets_identity() {
        let store = demo_store();
        store.login("admin", "admin").await.unwrap();

        assert_eq!(store.login("admin", "wrong").await, Ok(false));
        assert_eq!(store.current_identity(), None);
        assert_eq!(store.session().authenticated_at, None);
    }

    #[tokio::test]
    async fn test_empty_fields_skip_the_collaborator() {
        let store = SessionStore::new(Arc::new(MockAuthenticator::new_failing()));
        assert_eq!(store.login("", "pw").await, Err(LoginError::MissingFields));
        assert_eq!(store.login("user", "").await, Err(LoginError::MissingFields));
        assert!(!store.session().is_loading);
    }

    #[tokio::test]
    async fn test_transient_failure_propagates() {
        let store = SessionStore::new(Arc::new(MockAuthenticator::new_failing()));
        let result = store.login("nurse", "nurse").await;
        assert!(matches!(result, Err(LoginError::Transient(_))));
        assert_eq!(store.current_identity(), None);
        assert!(!store.session().is_loading);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_notifies_once() {
        let store = demo_store();
        store.login("admin", "admin").await.unwrap();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.logout();
        assert!(rx.has_changed().unwrap());
        let after_first = rx.borrow_and_update().clone();

        store.logout();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.session(), after_first);
        assert_eq!(after_first.identity, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_while_in_flight() {
        let auth = DemoAuthenticator::from_config(&AppConfig {
            auth_latency_ms: 1000,
            ..AppConfig::default()
        });
        let store = Arc::new(SessionStore::new(Arc::new(auth)));

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.login("admin", "admin").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.session().is_loading);

        assert_eq!(pending.await.unwrap(), Ok(true));
        assert!(!store.session().is_loading);
    }

    /// Resolves each username after its own delay; `credential == "ok"` succeeds.
    struct StaggeredAuthenticator;

    #[async_trait::async_trait]
    impl crate::auth::Authenticator for StaggeredAuthenticator {
        async fn authenticate(
            &self,
            username: &str,
            credential: &str,
        ) -> Result<Identity, AuthError> {
            let delay = if username == "fast" { 100 } else { 200 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if credential != "ok" {
                return Err(AuthError::InvalidCredentials);
            }
            Ok(Identity {
                username: username.to_string(),
                full_name: username.to_string(),
                role: crate::models::Role::Doctor,
            })
        }
    }

    async fn race(
        fast_credential: &'static str,
        slow_credential: &'static str,
    ) -> (Arc<SessionStore>, Result<bool, LoginError>, Result<bool, LoginError>) {
        let store = Arc::new(SessionStore::new(Arc::new(StaggeredAuthenticator)));
        let fast = tokio::spawn({
            let store = store.clone();
            async move { store.login("fast", fast_credential).await }
        });
        let slow = tokio::spawn({
            let store = store.clone();
            async move { store.login("slow", slow_credential).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.session().is_loading);

        // The fast attempt has resolved, the slow one is still pending.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.session().is_loading);

        let fast = fast.await.unwrap();
        let slow = slow.await.unwrap();
        (store, fast, slow)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_logins_last_resolution_wins() {
        let (store, fast, slow) = race("ok", "wrong").await;
        assert_eq!(fast, Ok(true));
        assert_eq!(slow, Ok(false));
        assert_eq!(store.current_identity(), None);
        assert!(!store.session().is_loading);

        let (store, fast, slow) = race("wrong", "ok").await;
        assert_eq!(fast, Ok(false));
        assert_eq!(slow, Ok(true));
        assert_eq!(store.current_identity().unwrap().username, "slow");
        assert!(!store.session().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_login_releases_loading_flag() {
        let auth = DemoAuthenticator::from_config(&AppConfig {
            auth_latency_ms: 1000,
            ..AppConfig::default()
        });
        let store = SessionStore::new(Arc::new(auth));

        let attempt = tokio::time::timeout(
            Duration::from_millis(100),
            store.login("admin", "admin"),
        )
        .await;
        assert!(attempt.is_err());
        assert!(!store.session().is_loading);
        assert_eq!(store.current_identity(), None);
    }

    #[tokio::test]
    async fn test_observer_stops_when_store_dropped() {
        let store = Arc::new(demo_store());
        let handle = spawn_session_observer(store.clone());
        store.login("admin", "admin").await.unwrap();
        store.logout();
        drop(store);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("observer should exit once the store is gone")
            .unwrap();
    }
}
