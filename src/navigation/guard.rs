use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use super::{
    shell::NavigationShell,
    table::{Route, RouteCategory, RouteEntry, RouteTable, View},
};
use crate::models::Session;

/// Upper bound on redirects followed by `navigate`.
pub const MAX_REDIRECTS: usize = 8;

/// Page
///
/// A view the client should render. Protected views carry the navigation
/// chrome; auth-only and not-found views are rendered bare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page {
    pub view: View,
    pub title: String,
    pub path: String,
    pub chrome: Option<NavigationShell>,
}

impl Page {
    fn bare(view: View, path: &str) -> Self {
        Self {
            view,
            title: view.title().to_string(),
            path: path.to_string(),
            chrome: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.view == View::NotFound
    }
}

/// Decision
///
/// Result of evaluating one navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render(Page),
    Redirect(String),
}

/// protected_guard
///
/// Renders `entry` inside the shell when the session has an identity,
/// otherwise sends the client to the login path.
pub fn protected_guard(session: &Session, table: &RouteTable, entry: &RouteEntry) -> Decision {
    match &session.identity {
        Some(identity) => Decision::Render(Page {
            chrome: Some(NavigationShell::new(identity, &entry.path)),
            ..Page::bare(entry.view, &entry.path)
        }),
        None => Decision::Redirect(table.login_path().to_string()),
    }
}

/// auth_only_guard
///
/// Sends signed-in users to the landing path, renders `entry` bare otherwise.
pub fn auth_only_guard(session: &Session, table: &RouteTable, entry: &RouteEntry) -> Decision {
    if session.is_authenticated() {
        Decision::Redirect(table.landing_path().to_string())
    } else {
        Decision::Render(Page::bare(entry.view, &entry.path))
    }
}

/// resolve
///
/// Evaluates a single navigation event. The root path forwards to the landing
/// path without consulting the session; the guard on the landing path then
/// decides. Unregistered paths render not-found in either state.
pub fn resolve(table: &RouteTable, path: &str, session: &Session) -> Decision {
    match table.lookup(path) {
        Route::Root => Decision::Redirect(table.landing_path().to_string()),
        Route::Registered(entry) => match entry.category {
            RouteCategory::Protected => protected_guard(session, table, entry),
            RouteCategory::AuthOnly => auth_only_guard(session, table, entry),
        },
        Route::Unmatched => Decision::Render(Page::bare(View::NotFound, path)),
    }
}

/// Navigation
///
/// A navigation followed to the page that finally renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Navigation {
    pub requested: String,
    /// Every redirect target, in order.
    pub redirects: Vec<String>,
    pub page: Page,
}

impl Navigation {
    /// The path the client ends up on.
    pub fn final_path(&self) -> &str {
        self.redirects.last().unwrap_or(&self.requested)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("redirect loop starting at {requested}: {chain:?}")]
    TooManyRedirects {
        requested: String,
        chain: Vec<String>,
    },
}

/// navigate
///
/// Applies `resolve` repeatedly until a page renders, against one session
/// snapshot.
pub fn navigate(
    table: &RouteTable,
    path: &str,
    session: &Session,
) -> Result<Navigation, NavigationError> {
    let mut redirects = Vec::new();
    let mut current = path.to_string();

    loop {
        match resolve(table, &current, session) {
            Decision::Render(page) => {
                return Ok(Navigation {
                    requested: path.to_string(),
                    redirects,
                    page,
                });
            }
            Decision::Redirect(target) => {
                if redirects.len() == MAX_REDIRECTS {
                    return Err(NavigationError::TooManyRedirects {
                        requested: path.to_string(),
                        chain: redirects,
                    });
                }
                redirects.push(target.clone());
                current = target;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, Role};
    use chrono::Utc;

    fn signed_in() -> Session {
        Session {
            identity: Some(Identity {
                username: "admin".to_string(),
                full_name: "Clinic Administrator".to_string(),
                role: Role::Admin,
            }),
            is_loading: false,
            authenticated_at: Some(Utc::now()),
        }
    }

    fn entries_in(table: &RouteTable, category: RouteCategory) -> Vec<RouteEntry> {
        table
            .entries()
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    #[test]
    fn test_protected_paths_redirect_when_signed_out() {
        let table = RouteTable::clinic();
        let session = Session::default();
        for entry in entries_in(&table, RouteCategory::Protected) {
            assert_eq!(
                resolve(&table, &entry.path, &session),
                Decision::Redirect("/login".to_string()),
                "{} should redirect",
                entry.path
            );
        }
    }

    #[test]
    fn test_auth_only_paths_redirect_when_signed_in() {
        let table = RouteTable::clinic();
        let session = signed_in();
        for entry in entries_in(&table, RouteCategory::AuthOnly) {
            assert_eq!(
                resolve(&table, &entry.path, &session),
                Decision::Redirect("/dashboard".to_string())
            );
        }
    }

    #[test]
    fn test_protected_view_is_wrapped_in_shell() {
        let table = RouteTable::clinic();
        let Decision::Render(page) = resolve(&table, "/patients", &signed_in()) else {
            panic!("expected a rendered page");
        };
        assert_eq!(page.view, View::Patients);
        let chrome = page.chrome.unwrap();
        assert_eq!(chrome.active_entry().unwrap().path, "/patients");
    }

    #[test]
    fn test_auth_only_view_is_bare() {
        let table = RouteTable::clinic();
        let Decision::Render(page) = resolve(&table, "/register", &Session::default()) else {
            panic!("expected a rendered page");
        };
        assert_eq!(page.view, View::Register);
        assert!(page.chrome.is_none());
    }

    #[test]
    fn test_root_redirects_twice_when_signed_out() {
        let table = RouteTable::clinic();
        let nav = navigate(&table, "/", &Session::default()).unwrap();
        assert_eq!(nav.redirects, ["/dashboard", "/login"]);
        assert_eq!(nav.page.view, View::Login);
        assert_eq!(nav.final_path(), "/login");
    }

    #[test]
    fn test_root_lands_on_dashboard_when_signed_in() {
        let table = RouteTable::clinic();
        let nav = navigate(&table, "/", &signed_in()).unwrap();
        assert_eq!(nav.redirects, ["/dashboard"]);
        assert_eq!(nav.page.view, View::Dashboard);
    }

    #[test]
    fn test_unknown_path_is_not_found_in_both_states() {
        let table = RouteTable::clinic();
        for session in [Session::default(), signed_in()] {
            let nav = navigate(&table, "/reports", &session).unwrap();
            assert!(nav.redirects.is_empty());
            assert!(nav.page.is_not_found());
            assert!(nav.page.chrome.is_none());
        }
    }

    #[test]
    fn test_redirect_loop_is_reported() {
        // The login path is itself protected, so a signed-out user is sent
        // back to it forever.
        let table = RouteTable::new(
            vec![
                RouteEntry::new("/in", RouteCategory::AuthOnly, View::Login),
                RouteEntry::new("/out", RouteCategory::Protected, View::Dashboard),
            ],
            "/out",
            "/in",
        )
        .unwrap();
        let err = navigate(&table, "/out", &Session::default()).unwrap_err();
        let NavigationError::TooManyRedirects { chain, .. } = err;
        assert_eq!(chain.len(), MAX_REDIRECTS);
    }
}
