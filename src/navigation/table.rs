use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";

/// View
///
/// The closed set of screens the portal can show. The screens themselves are
/// rendered by the browser client; the server only decides which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum View {
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Patients,
    Appointments,
    Visits,
    Records,
    Chatbot,
    Notifications,
    NotFound,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Login => "Sign in",
            View::Register => "Create account",
            View::ForgotPassword => "Forgot password",
            View::Dashboard => "Dashboard",
            View::Patients => "Patients",
            View::Appointments => "Appointments",
            View::Visits => "Visits",
            View::Records => "Medical records",
            View::Chatbot => "Chatbot",
            View::Notifications => "Notifications",
            View::NotFound => "Page not found",
        }
    }
}

/// RouteCategory
///
/// Which session state a registered path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RouteCategory {
    /// Requires an absent session (login, register, forgot-password).
    AuthOnly,
    /// Requires a present session.
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub category: RouteCategory,
    pub view: View,
}

impl RouteEntry {
    pub fn new(path: &str, category: RouteCategory, view: View) -> Self {
        Self {
            path: path.to_string(),
            category,
            view,
        }
    }
}

/// Route
///
/// Outcome of looking a requested path up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/`, which always forwards to the landing path.
    Root,
    Registered(&'a RouteEntry),
    /// Wildcard fallback; belongs to neither category.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("path {0} is registered more than once")]
    DuplicatePath(String),
    #[error("path {0} is reserved for the root redirect")]
    ReservedPath(String),
    #[error("path {0} must start with '/'")]
    RelativePath(String),
}

/// RouteTable
///
/// Ordered, immutable mapping from path to view and category. Built once at
/// startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    login_path: String,
    landing_path: String,
}

impl RouteTable {
    /// new
    ///
    /// Checks that every path is absolute, that no path is registered twice
    /// (so it belongs to exactly one category), and that `/` is left to the
    /// root redirect.
    pub fn new(
        entries: Vec<RouteEntry>,
        login_path: &str,
        landing_path: &str,
    ) -> Result<Self, RouteTableError> {
        let mut seen: Vec<String> = Vec::with_capacity(entries.len());
        for entry in &entries {
            if !entry.path.starts_with('/') {
                return Err(RouteTableError::RelativePath(entry.path.clone()));
            }
            let normalized = normalize(&entry.path);
            if normalized == ROOT_PATH {
                return Err(RouteTableError::ReservedPath(entry.path.clone()));
            }
            if seen.contains(&normalized) {
                return Err(RouteTableError::DuplicatePath(entry.path.clone()));
            }
            seen.push(normalized);
        }

        Ok(Self {
            entries,
            login_path: login_path.to_string(),
            landing_path: landing_path.to_string(),
        })
    }

    /// The clinic portal's screens.
    pub fn clinic() -> Self {
        use RouteCategory::{AuthOnly, Protected};

        let entries = vec![
            RouteEntry::new("/login", AuthOnly, View::Login),
            RouteEntry::new("/register", AuthOnly, View::Register),
            RouteEntry::new("/forgot-password", AuthOnly, View::ForgotPassword),
            RouteEntry::new("/dashboard", Protected, View::Dashboard),
            RouteEntry::new("/patients", Protected, View::Patients),
            RouteEntry::new("/appointments", Protected, View::Appointments),
            RouteEntry::new("/visits", Protected, View::Visits),
            RouteEntry::new("/records", Protected, View::Records),
            RouteEntry::new("/chatbot", Protected, View::Chatbot),
            RouteEntry::new("/notifications", Protected, View::Notifications),
        ];

        Self {
            entries,
            login_path: LOGIN_PATH.to_string(),
            landing_path: LANDING_PATH.to_string(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// lookup
    ///
    /// Matches case-insensitively and ignores a trailing slash, first match wins.
    pub fn lookup(&self, path: &str) -> Route<'_> {
        let wanted = normalize(path);
        if wanted == ROOT_PATH {
            return Route::Root;
        }
        self.entries
            .iter()
            .find(|entry| normalize(&entry.path) == wanted)
            .map_or(Route::Unmatched, Route::Registered)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::clinic()
    }
}

// Lowercases and drops trailing slashes; an empty result is the root.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ROOT_PATH.to_string();
    }
    trimmed.to_ascii_lowercase()
}
