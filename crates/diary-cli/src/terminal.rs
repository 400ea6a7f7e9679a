//! Terminal stand-ins for the notifier and router.
//!
//! Notifications go to stderr so stdout stays clean for ids and JSON.

use std::sync::{Mutex, PoisonError};

use diary_core::controller::{Notifier, NotifyKind};
use diary_core::session::{Route, Router};

#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        eprintln!("{}", render_notification(kind, message));
    }
}

pub fn render_notification(kind: NotifyKind, message: &str) -> String {
    match kind {
        NotifyKind::Success => message.to_string(),
        NotifyKind::Warning => format!("warning: {message}"),
        NotifyKind::Error => format!("error: {message}"),
    }
}

/// Remembers where the session layer last sent the user.
#[derive(Debug, Default)]
pub struct TerminalRouter {
    last: Mutex<Option<Route>>,
}

impl TerminalRouter {
    pub fn last_route(&self) -> Option<Route> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Router for TerminalRouter {
    fn navigate(&self, route: Route) {
        tracing::debug!("Navigating to {}", route.path());
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}
