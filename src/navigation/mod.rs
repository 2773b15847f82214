//! Session-gated navigation.
//!
//! `table` holds the static path → view registry, `guard` decides per
//! navigation event whether a view renders or redirects, and `shell` builds
//! the chrome around protected views.

/// The route registry and the closed set of views.
pub mod table;

/// The protected and auth-only guards plus the `resolve`/`navigate` decision functions.
pub mod guard;

/// Side navigation and header shown to signed-in users.
pub mod shell;

pub use guard::{Decision, Navigation, NavigationError, Page, navigate, resolve};
pub use shell::NavigationShell;
pub use table::{RouteCategory, RouteEntry, RouteTable, View};
