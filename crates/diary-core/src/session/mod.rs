//! Session token ownership and protected-view gating.
//!
//! The session is a client-side artifact: a single token string kept in
//! durable storage. Gating trusts its presence alone; `validate` is the
//! explicit server round-trip for callers that need more than that.

mod storage;

use std::sync::{Arc, PoisonError, RwLock};

use crate::api::{AuthToken, DiaryBackend};
use crate::models::UserProfile;
use crate::{Error, Result};

pub use storage::{MemoryTokenStorage, StorageResult, TokenStorage};

/// Views the session layer can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login/register view at `/`.
    EntryPoint,
    /// Protected diary view at `/home`.
    Home,
}

impl Route {
    pub const fn path(self) -> &'static str {
        match self {
            Self::EntryPoint => "/",
            Self::Home => "/home",
        }
    }
}

/// Navigation capability provided by the presentation layer.
pub trait Router {
    fn navigate(&self, route: Route);
}

/// Outcome of mounting a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny,
}

impl GuardDecision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Process-wide session handle. Clones share the same token.
pub struct SessionManager<S: TokenStorage> {
    inner: Arc<SessionInner<S>>,
}

impl<S: TokenStorage> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<S> {
    storage: S,
    token: RwLock<Option<AuthToken>>,
}

impl<S: TokenStorage> SessionManager<S> {
    /// Create a manager, loading any token already persisted in `storage`.
    pub fn new(storage: S) -> Self {
        let token = match storage.load_token() {
            Ok(raw) => raw.and_then(AuthToken::new),
            Err(error) => {
                tracing::warn!("Failed to read persisted session token: {}", error);
                None
            }
        };
        Self {
            inner: Arc::new(SessionInner {
                storage,
                token: RwLock::new(token),
            }),
        }
    }

    /// Current token, if any. Presence only; the server is not consulted.
    pub fn get_token(&self) -> Option<AuthToken> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Token for an authenticated call, or `NotAuthenticated`.
    pub fn require_token(&self) -> Result<AuthToken> {
        self.get_token().ok_or(Error::NotAuthenticated)
    }

    /// Persist `token` and make it the current session.
    pub fn set_token(&self, token: AuthToken) {
        if let Err(error) = self.inner.storage.save_token(token.as_str()) {
            tracing::warn!("Failed to persist session token: {}", error);
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        tracing::info!("Session token stored");
    }

    /// Remove the persisted token.
    pub fn clear(&self) {
        if let Err(error) = self.inner.storage.clear_token() {
            tracing::warn!("Failed to clear persisted session token: {}", error);
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Gate a protected view on token presence.
    ///
    /// On deny the session is cleared and the router is sent to the entry
    /// point.
    pub fn guard_protected(&self, router: &impl Router) -> GuardDecision {
        if self.is_authenticated() {
            return GuardDecision::Allow;
        }
        tracing::info!("No session token; leaving protected view");
        self.clear();
        router.navigate(Route::EntryPoint);
        GuardDecision::Deny
    }

    /// Skip the login view when a token is already present.
    pub fn redirect_if_authenticated(&self, router: &impl Router) -> bool {
        if self.is_authenticated() {
            router.navigate(Route::Home);
            true
        } else {
            false
        }
    }

    /// Clear the session and return to the entry point.
    ///
    /// Purely local: no server-side invalidation call is made.
    pub fn logout(&self, router: &impl Router) {
        self.clear();
        tracing::info!("Signed out");
        router.navigate(Route::EntryPoint);
    }

    /// Confirm the token with the backend by fetching its profile.
    pub async fn validate<B: DiaryBackend>(&self, backend: &B) -> Result<UserProfile> {
        let token = self.require_token()?;
        backend.current_user(&token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, RecordingRouter};

    fn token(raw: &str) -> AuthToken {
        AuthToken::new(raw).unwrap()
    }

    #[test]
    fn set_then_get_returns_token_until_cleared() {
        let session = SessionManager::new(MemoryTokenStorage::default());
        assert!(session.get_token().is_none());

        session.set_token(token("abc"));
        assert_eq!(session.get_token(), Some(token("abc")));
        assert!(session.is_authenticated());

        session.clear();
        assert!(session.get_token().is_none());
    }

    #[test]
    fn token_survives_reload_through_storage() {
        let storage = MemoryTokenStorage::default();
        SessionManager::new(storage.clone()).set_token(token("persisted"));

        let reloaded = SessionManager::new(storage);
        assert_eq!(reloaded.get_token(), Some(token("persisted")));
    }

    #[test]
    fn clones_share_the_same_session() {
        let session = SessionManager::new(MemoryTokenStorage::default());
        let other = session.clone();
        session.set_token(token("shared"));
        assert!(other.is_authenticated());
    }

    #[test]
    fn blank_persisted_token_counts_as_absent() {
        let storage = MemoryTokenStorage::with_token("   ");
        let session = SessionManager::new(storage);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn guard_denies_and_redirects_without_token() {
        let storage = MemoryTokenStorage::with_token("");
        let session = SessionManager::new(storage.clone());
        let router = RecordingRouter::default();

        assert_eq!(session.guard_protected(&router), GuardDecision::Deny);
        assert_eq!(router.routes(), vec![Route::EntryPoint]);
        assert_eq!(storage.load_token().unwrap(), None);
    }

    #[test]
    fn guard_allows_with_token_and_does_not_navigate() {
        let session = SessionManager::new(MemoryTokenStorage::with_token("abc"));
        let router = RecordingRouter::default();

        assert!(session.guard_protected(&router).is_allowed());
        assert!(router.routes().is_empty());
    }

    #[test]
    fn entry_point_redirects_home_when_signed_in() {
        let router = RecordingRouter::default();
        let signed_out = SessionManager::new(MemoryTokenStorage::default());
        assert!(!signed_out.redirect_if_authenticated(&router));

        let signed_in = SessionManager::new(MemoryTokenStorage::with_token("abc"));
        assert!(signed_in.redirect_if_authenticated(&router));
        assert_eq!(router.routes(), vec![Route::Home]);
    }

    #[test]
    fn logout_clears_and_navigates_to_entry_point() {
        let storage = MemoryTokenStorage::with_token("abc");
        let session = SessionManager::new(storage.clone());
        let router = RecordingRouter::default();

        session.logout(&router);

        assert!(!session.is_authenticated());
        assert_eq!(storage.load_token().unwrap(), None);
        assert_eq!(router.routes(), vec![Route::EntryPoint]);
    }

    #[tokio::test]
    async fn validate_without_token_makes_no_request() {
        let session = SessionManager::new(MemoryTokenStorage::default());
        let backend = FakeBackend::default();

        let error = session.validate(&backend).await.unwrap_err();
        assert!(matches!(error, Error::NotAuthenticated));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn validate_returns_profile_for_token() {
        let session = SessionManager::new(MemoryTokenStorage::with_token("abc"));
        let backend = FakeBackend::default();

        let profile = session.validate(&backend).await.unwrap();
        assert_eq!(profile.display_name(), "tester");
    }

    #[tokio::test]
    async fn validate_surfaces_backend_rejection() {
        let session = SessionManager::new(MemoryTokenStorage::with_token("expired"));
        let backend = FakeBackend::default();
        backend.fail_next_profile(401, "jwt expired");

        let error = session.validate(&backend).await.unwrap_err();
        assert_eq!(error.server_message(), Some("jwt expired"));
        assert!(session.is_authenticated());
    }
}
