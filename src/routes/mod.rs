//! Router Module Index
//!
//! Splits the portal's HTTP surface by what it serves. None of these routes is
//! rejected at the HTTP layer for lack of a session: gating happens in the
//! navigation guards, which turn a disallowed page into a redirect.

/// Liveness probe.
pub mod public;

/// JSON endpoints behind the login, register and forgot-password forms, the
/// logout control, and navigation resolution.
pub mod api;

/// Catch-all browser navigation, evaluated by the route guards.
pub mod pages;
