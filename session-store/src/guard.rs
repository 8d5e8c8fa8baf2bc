//! Route decisions derived from the session, for protected and public-only
//! views.

use crate::store::SessionState;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    /// A session call is in flight; show a placeholder instead of deciding.
    Wait,
    Redirect(&'static str),
}

/// Gate for dashboard pages.
pub fn protect(state: &SessionState) -> RouteDecision {
    if state.is_authenticated() {
        RouteDecision::Render
    } else if state.is_loading() {
        RouteDecision::Wait
    } else {
        RouteDecision::Redirect(LOGIN_PATH)
    }
}

/// Gate for login/registration pages: signed-in users go to the dashboard.
pub fn public_only(state: &SessionState) -> RouteDecision {
    if state.is_authenticated() {
        RouteDecision::Redirect(DASHBOARD_PATH)
    } else {
        RouteDecision::Render
    }
}
