use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{models::Identity, session::SessionStore};

pub const PORTAL_TITLE: &str = "Clinic management system";
pub const LOGOUT_ENDPOINT: &str = "/api/session";

// Sidebar entries in display order. `/reports` and `/settings` have no
// registered view yet and fall through to not-found.
const MAIN_ENTRIES: &[(&str, &str)] = &[
    ("Dashboard", "/dashboard"),
    ("Patients", "/patients"),
    ("Appointments", "/appointments"),
    ("Visits", "/visits"),
    ("Medical records", "/records"),
    ("Chatbot", "/chatbot"),
    ("Notifications", "/notifications"),
    ("Reports", "/reports"),
];

const OTHER_ENTRIES: &[(&str, &str)] = &[("Register", "/register"), ("Settings", "/settings")];

/// NavigationShell
///
/// The chrome drawn around every protected view: side navigation plus a header
/// showing who is signed in and a logout control. Only built behind the
/// protected guard, so an identity is always available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavigationShell {
    pub header: ShellHeader,
    pub sections: Vec<NavSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShellHeader {
    pub title: String,
    pub identity: Identity,
    pub role_label: String,
    pub logout: LogoutControl,
}

/// Where the client sends the logout action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LogoutControl {
    pub method: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavSection {
    pub label: String,
    pub entries: Vec<NavEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavEntry {
    pub title: String,
    pub path: String,
    pub active: bool,
}

impl NavigationShell {
    /// Builds the chrome for `identity` with the entry for `active_path` highlighted.
    pub fn new(identity: &Identity, active_path: &str) -> Self {
        Self {
            header: ShellHeader {
                title: PORTAL_TITLE.to_string(),
                identity: identity.clone(),
                role_label: identity.role.label().to_string(),
                logout: LogoutControl {
                    method: "DELETE".to_string(),
                    href: LOGOUT_ENDPOINT.to_string(),
                },
            },
            sections: vec![
                section("Main", MAIN_ENTRIES, active_path),
                section("Other", OTHER_ENTRIES, active_path),
            ],
        }
    }

    /// logout
    ///
    /// The shell's only action. Hands off to the store; the guards pick up the
    /// change on the next navigation.
    pub fn logout(&self, store: &SessionStore) {
        store.logout();
    }

    pub fn active_entry(&self) -> Option<&NavEntry> {
        self.sections
            .iter()
            .flat_map(|section| section.entries.iter())
            .find(|entry| entry.active)
    }
}

fn section(label: &str, entries: &[(&str, &str)], active_path: &str) -> NavSection {
    NavSection {
        label: label.to_string(),
        entries: entries
            .iter()
            .map(|(title, path)| NavEntry {
                title: title.to_string(),
                path: path.to_string(),
                active: path.eq_ignore_ascii_case(active_path.trim_end_matches('/')),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockAuthenticator;
    use crate::models::Role;
    use std::sync::Arc;

    fn doctor() -> Identity {
        Identity {
            username: "dr.minh".to_string(),
            full_name: "Tran Van Minh".to_string(),
            role: Role::Doctor,
        }
    }

    #[test]
    fn test_shell_highlights_active_entry() {
        let shell = NavigationShell::new(&doctor(), "/visits");
        let active = shell.active_entry().unwrap();
        assert_eq!(active.path, "/visits");
        assert_eq!(
            shell
                .sections
                .iter()
                .flat_map(|s| &s.entries)
                .filter(|e| e.active)
                .count(),
            1
        );
    }

    #[test]
    fn test_header_shows_identity() {
        let shell = NavigationShell::new(&doctor(), "/dashboard");
        assert_eq!(shell.header.identity.full_name, "Tran Van Minh");
        assert_eq!(shell.header.role_label, "Doctor");
        assert_eq!(shell.header.logout.href, LOGOUT_ENDPOINT);
    }

    #[test]
    fn test_sidebar_sections() {
        let shell = NavigationShell::new(&doctor(), "/dashboard");
        let labels: Vec<&str> = shell.sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Main", "Other"]);
        assert_eq!(shell.sections[0].entries.len(), 8);
    }

    #[tokio::test]
    async fn test_logout_delegates_to_store() {
        let store = SessionStore::new(Arc::new(MockAuthenticator::new()));
        store.login("dr.minh", "dr.minh").await.unwrap();
        let identity = store.current_identity().unwrap();

        let shell = NavigationShell::new(&identity, "/dashboard");
        shell.logout(&store);
        assert_eq!(store.current_identity(), None);
    }
}
