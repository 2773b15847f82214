use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;

use crate::{
    config::AppConfig,
    models::{Identity, Role},
};

/// AuthError
///
/// The two ways the authentication collaborator can refuse an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The username/credential pair is not known.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The collaborator itself failed (the simulated call "threw").
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

/// Authenticator Contract
///
/// The external collaborator consulted by the session store. It is called once
/// per login attempt and resolves to an identity or a rejection. Transport,
/// storage and credential format are left to the implementation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Identity, AuthError>;
}

/// AuthState
///
/// The concrete type used to share the collaborator across the application.
pub type AuthState = Arc<dyn Authenticator>;

/// DemoAccount
///
/// One entry of the in-memory account directory.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub credential: String,
    pub identity: Identity,
}

/// DemoAuthenticator
///
/// In-memory account directory standing in for a real identity provider.
/// Every lookup waits for the configured latency first, so the loading state
/// of the session is observable.
#[derive(Debug, Clone)]
pub struct DemoAuthenticator {
    accounts: HashMap<String, DemoAccount>,
    latency: Duration,
}

impl DemoAuthenticator {
    pub fn new(latency: Duration) -> Self {
        Self {
            accounts: HashMap::new(),
            latency,
        }
    }

    /// Builds the directory advertised on the login screen: a single `admin` account.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.auth_latency()).with_account(
            &config.admin_password,
            Identity {
                username: "admin".to_string(),
                full_name: "Clinic Administrator".to_string(),
                role: Role::Admin,
            },
        )
    }

    pub fn with_account(mut self, credential: &str, identity: Identity) -> Self {
        self.accounts.insert(
            identity.username.clone(),
            DemoAccount {
                credential: credential.to_string(),
                identity,
            },
        );
        self
    }
}

#[async_trait]
impl Authenticator for DemoAuthenticator {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Identity, AuthError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.accounts.get(username) {
            Some(account) if account.credential == credential => Ok(account.identity.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// MockAuthenticator
///
/// Test double. Accepts any username whose credential equals the username,
/// unless `should_fail` is set, in which case every call is a collaborator fault.
#[derive(Debug, Clone, Default)]
pub struct MockAuthenticator {
    /// When true, all calls return `AuthError::Unavailable`.
    pub should_fail: bool,
}

impl MockAuthenticator {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Identity, AuthError> {
        if self.should_fail {
            return Err(AuthError::Unavailable(
                "Mock Auth Error: Simulation requested".to_string(),
            ));
        }
        if username != credential {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Identity {
            username: username.to_string(),
            full_name: format!("Mock {username}"),
            role: Role::Doctor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_directory_accepts_admin() {
        let auth = DemoAuthenticator::from_config(&AppConfig::default());
        let identity = auth.authenticate("admin", "admin").await.unwrap();
        assert_eq!(identity.username, "admin");
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_demo_directory_rejects_wrong_credential_and_unknown_user() {
        let auth = DemoAuthenticator::from_config(&AppConfig::default());
        assert_eq!(
            auth.authenticate("admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.authenticate("x", "admin").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_directory_waits_for_latency() {
        let auth = DemoAuthenticator::new(Duration::from_secs(1)).with_account(
            "pw",
            Identity {
                username: "nurse".to_string(),
                full_name: "Night Nurse".to_string(),
                role: Role::Patient,
            },
        );
        let started = tokio::time::Instant::now();
        auth.authenticate("nurse", "pw").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_mock_failure_mode() {
        let auth = MockAuthenticator::new_failing();
        assert!(matches!(
            auth.authenticate("a", "a").await,
            Err(AuthError::Unavailable(_))
        ));
    }
}
