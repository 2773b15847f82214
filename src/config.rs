use std::{env, time::Duration};

/// AppConfig
///
/// Holds the portal's configuration. Loaded once at startup and cloned into the
/// application state; nothing mutates it afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and credential fallbacks.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Simulated round-trip of the authentication collaborator and the
    // registration call, in milliseconds. Password reset takes 1.5x this.
    pub auth_latency_ms: u64,
    // Credential for the built-in `admin` demo account.
    pub admin_password: String,
}

/// Env
///
/// Defines the runtime context: developer conveniences (pretty logs, demo
/// credential fallback) versus production behaviour (JSON logs, explicit secrets).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: local mode, no simulated latency.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            auth_latency_ms: 0,
            admin_password: "admin".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `CLINIC_ADMIN_PASSWORD` is missing, and whenever
    /// `AUTH_LATENCY_MS` is set but is not an unsigned integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let admin_password = match env {
            Env::Production => env::var("CLINIC_ADMIN_PASSWORD")
                .expect("FATAL: CLINIC_ADMIN_PASSWORD must be set in production."),
            // The demo account from the login screen.
            Env::Local => {
                env::var("CLINIC_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string())
            }
        };

        let auth_latency_ms = env::var("AUTH_LATENCY_MS")
            .map(|raw| {
                raw.parse::<u64>()
                    .expect("FATAL: AUTH_LATENCY_MS must be an unsigned integer.")
            })
            .unwrap_or(1000);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            env,
            bind_addr,
            auth_latency_ms,
            admin_password,
        }
    }

    /// The simulated collaborator latency as a `Duration`.
    pub fn auth_latency(&self) -> Duration {
        Duration::from_millis(self.auth_latency_ms)
    }

    /// Round-trip of the password reset call: half again the login latency
    /// (1500ms against the default 1000ms).
    pub fn reset_latency(&self) -> Duration {
        Duration::from_millis(self.auth_latency_ms.saturating_mul(3) / 2)
    }
}
