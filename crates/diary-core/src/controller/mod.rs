//! User actions for the diary views.
//!
//! `DiaryController` wires the session, the entry store and the upload
//! pipeline to the presentation layer's `Notifier` and `Router`. Each action
//! reports its own failure once through the notifier and returns the error to
//! the caller; nothing is retried.
//!
//! Actions race their work against the view's cancellation token. Store
//! mutations happen only after the awaited response, so an action cancelled
//! by [`DiaryController::teardown_view`] leaves all state untouched.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::api::{DiaryBackend, LoginRequest, RegisterRequest};
use crate::media::{AssetHost, AssetUploadPipeline, UploadTask};
use crate::models::{DiaryEntry, Draft, EntryFields, EntryId, ImageSelection, UserProfile};
use crate::search::filter_entries;
use crate::session::{GuardDecision, Route, Router, SessionManager, TokenStorage};
use crate::store::EntryStore;
use crate::{Error, ErrorKind, Result};

pub const MSG_REQUIRED_FIELDS: &str = "Title and Description are required.";
pub const MSG_ENTRY_ADDED: &str = "New diary entry added!";
pub const MSG_ADD_FAILED: &str = "Failed to add new entry.";
pub const MSG_ENTRY_UPDATED: &str = "Entry updated successfully!";
pub const MSG_UPDATE_FAILED: &str = "Failed to update entry.";
pub const MSG_ENTRY_DELETED: &str = "Entry deleted!";
pub const MSG_DELETE_FAILED: &str = "Failed to delete entry.";
pub const MSG_LOAD_FAILED: &str = "Failed to load entries.";
pub const MSG_PROFILE_FAILED: &str = "Failed to load user profile.";
pub const MSG_UPLOAD_FAILED: &str = "Failed to upload images.";
pub const MSG_LOGIN_SUCCESS: &str = "Login Success";
pub const MSG_LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const MSG_REGISTER_SUCCESS: &str = "Registration Success";
pub const MSG_REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MSG_CREDENTIALS_REQUIRED: &str = "All fields are required.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Warning,
    Error,
}

/// Toast-style message sink provided by the presentation layer.
pub trait Notifier {
    fn notify(&self, kind: NotifyKind, message: &str);
}

/// Composition root for the login and diary views.
pub struct DiaryController<B, H, S, N, R>
where
    B: DiaryBackend,
    H: AssetHost,
    S: TokenStorage,
{
    session: SessionManager<S>,
    store: EntryStore<B, S>,
    backend: B,
    pipeline: AssetUploadPipeline<H>,
    notifier: N,
    router: R,
    draft: Draft,
    submission_open: bool,
    editing: Option<EntryId>,
    search_term: String,
    profile: Option<UserProfile>,
    entries_loaded: bool,
    view: CancellationToken,
}

impl<B, H, S, N, R> DiaryController<B, H, S, N, R>
where
    B: DiaryBackend + Clone,
    H: AssetHost,
    S: TokenStorage,
    N: Notifier,
    R: Router,
{
    pub fn new(session: SessionManager<S>, backend: B, host: H, notifier: N, router: R) -> Self {
        Self {
            store: EntryStore::new(backend.clone(), session.clone()),
            session,
            backend,
            pipeline: AssetUploadPipeline::new(host),
            notifier,
            router,
            draft: Draft::default(),
            submission_open: false,
            editing: None,
            search_term: String::new(),
            profile: None,
            entries_loaded: false,
            view: CancellationToken::new(),
        }
    }

    pub const fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    pub const fn store(&self) -> &EntryStore<B, S> {
        &self.store
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub const fn router(&self) -> &R {
        &self.router
    }

    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    pub const fn is_submission_open(&self) -> bool {
        self.submission_open
    }

    pub const fn editing(&self) -> Option<&EntryId> {
        self.editing.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Whether the last [`Self::load_view`] fetched the entry list.
    pub const fn entries_loaded(&self) -> bool {
        self.entries_loaded
    }

    /// Handle that cancels the current view's in-flight actions.
    pub fn view_token(&self) -> CancellationToken {
        self.view.clone()
    }

    /// Mount the diary view.
    ///
    /// Without a token the view is denied and nothing is fetched. Otherwise
    /// the entry list and the profile are loaded concurrently; each failure
    /// is reported on its own.
    pub async fn load_view(&mut self) -> GuardDecision {
        if self.view.is_cancelled() {
            self.view = CancellationToken::new();
        }

        let decision = self.session.guard_protected(&self.router);
        let Some(token) = self.session.get_token().filter(|_| decision.is_allowed()) else {
            self.store.clear();
            self.profile = None;
            self.entries_loaded = false;
            return GuardDecision::Deny;
        };

        let view = self.view.clone();
        let backend = &self.backend;
        let store = &mut self.store;
        let (entries, profile) = tokio::join!(
            cancellable(&view, async { store.fetch_all().await.map(<[DiaryEntry]>::len) }),
            cancellable(&view, backend.current_user(&token)),
        );

        self.entries_loaded = entries.is_ok();
        match entries {
            Ok(count) => tracing::info!("Loaded {} entries", count),
            Err(error) => self.report(&error, MSG_LOAD_FAILED),
        }
        match profile {
            Ok(profile) => self.profile = Some(profile),
            Err(error) => self.report(&error, MSG_PROFILE_FAILED),
        }
        decision
    }

    /// Cancel every in-flight action of the current view.
    pub fn teardown_view(&self) {
        tracing::debug!("Tearing down diary view");
        self.view.cancel();
    }

    pub fn open_submission(&mut self) {
        self.submission_open = true;
    }

    pub fn close_submission(&mut self) {
        self.submission_open = false;
    }

    pub fn update_draft(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.draft.title = title.into();
        self.draft.description = description.into();
    }

    pub fn attach_image(&mut self, image: ImageSelection) {
        self.draft.images.push(image);
    }

    /// Discard the draft and close the submission surface.
    pub fn cancel_draft(&mut self) {
        if !self.draft.is_blank() {
            tracing::debug!("Discarding unsaved draft");
        }
        self.draft = Draft::default();
        self.submission_open = false;
    }

    /// Upload the draft's images, then create the entry.
    ///
    /// On any failure the draft is kept so the user can retry.
    pub async fn submit(&mut self) -> Result<DiaryEntry> {
        self.submit_observed(|_| {}).await
    }

    /// Same as [`Self::submit`], reporting upload progress to `observer`.
    pub async fn submit_observed(
        &mut self,
        observer: impl FnMut(&UploadTask<'_>),
    ) -> Result<DiaryEntry> {
        if let Err(error) = EntryFields::new(&self.draft.title, &self.draft.description) {
            self.notifier.notify(NotifyKind::Warning, MSG_REQUIRED_FIELDS);
            return Err(error);
        }

        let view = self.view.clone();
        let uploads = self
            .pipeline
            .upload_all_observed(&self.draft.images, &view, observer);
        let media = match uploads.await {
            Ok(media) => media,
            Err(error) => return self.fail(error, MSG_UPLOAD_FAILED),
        };

        let created = cancellable(
            &view,
            self.store
                .create(&self.draft.title, &self.draft.description, media),
        )
        .await;
        match created {
            Ok(entry) => {
                self.draft = Draft::default();
                self.submission_open = false;
                self.notifier.notify(NotifyKind::Success, MSG_ENTRY_ADDED);
                Ok(entry)
            }
            Err(error) => self.fail(error, MSG_ADD_FAILED),
        }
    }

    /// Show an entry's details.
    pub fn select(&mut self, id: &EntryId) -> Result<&DiaryEntry> {
        self.store.select(id)
    }

    /// Enter edit mode for `id`, selecting it.
    pub fn begin_edit(&mut self, id: &EntryId) -> Result<()> {
        self.store.select(id)?;
        self.editing = Some(id.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Save the entry in edit mode. Edit mode is left only on success.
    pub async fn save_edit(&mut self, title: &str, description: &str) -> Result<DiaryEntry> {
        let Some(id) = self.editing.clone() else {
            return Err(Error::InvalidInput("No entry is being edited".to_string()));
        };
        if let Err(error) = EntryFields::new(title, description) {
            self.notifier.notify(NotifyKind::Warning, MSG_REQUIRED_FIELDS);
            return Err(error);
        }

        let view = self.view.clone();
        match cancellable(&view, self.store.update(&id, title, description)).await {
            Ok(entry) => {
                self.editing = None;
                self.notifier.notify(NotifyKind::Success, MSG_ENTRY_UPDATED);
                Ok(entry)
            }
            Err(error) => self.fail(error, MSG_UPDATE_FAILED),
        }
    }

    /// Delete an entry. Edit mode for it ends whatever the outcome.
    pub async fn delete(&mut self, id: &EntryId) -> Result<()> {
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }

        let view = self.view.clone();
        match cancellable(&view, self.store.delete(id)).await {
            Ok(()) => {
                self.notifier.notify(NotifyKind::Success, MSG_ENTRY_DELETED);
                Ok(())
            }
            Err(error) => self.fail(error, MSG_DELETE_FAILED),
        }
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Entries matching the current search term, in store order.
    pub fn visible_entries(&self) -> Vec<&DiaryEntry> {
        filter_entries(self.store.entries(), &self.search_term)
    }

    /// Sign out locally and drop everything the view held.
    pub fn logout(&mut self) {
        self.view.cancel();
        self.session.logout(&self.router);
        self.store.clear();
        self.draft = Draft::default();
        self.submission_open = false;
        self.editing = None;
        self.search_term.clear();
        self.profile = None;
        self.entries_loaded = false;
        self.view = CancellationToken::new();
    }

    /// Exchange credentials for a session and go to the diary view.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        if email.trim().is_empty() || password.is_empty() {
            self.notifier
                .notify(NotifyKind::Warning, MSG_CREDENTIALS_REQUIRED);
            return Err(Error::InvalidInput(MSG_CREDENTIALS_REQUIRED.to_string()));
        }
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let view = self.view.clone();
        match cancellable(&view, self.backend.login(&request)).await {
            Ok(token) => {
                self.session.set_token(token);
                self.notifier.notify(NotifyKind::Success, MSG_LOGIN_SUCCESS);
                self.router.navigate(Route::Home);
                Ok(())
            }
            Err(error) => self.fail(error, MSG_LOGIN_FAILED),
        }
    }

    /// Create an account. Registration does not sign the user in.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            self.notifier
                .notify(NotifyKind::Warning, MSG_CREDENTIALS_REQUIRED);
            return Err(Error::InvalidInput(MSG_CREDENTIALS_REQUIRED.to_string()));
        }
        if password != confirm_password {
            self.notifier.notify(NotifyKind::Error, MSG_PASSWORD_MISMATCH);
            return Err(Error::InvalidInput(MSG_PASSWORD_MISMATCH.to_string()));
        }
        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let view = self.view.clone();
        match cancellable(&view, self.backend.register(&request)).await {
            Ok(()) => {
                self.notifier
                    .notify(NotifyKind::Success, MSG_REGISTER_SUCCESS);
                Ok(())
            }
            Err(error) => self.fail(error, MSG_REGISTER_FAILED),
        }
    }

    fn fail<T>(&self, error: Error, fallback: &str) -> Result<T> {
        self.report(&error, fallback);
        Err(error)
    }

    /// Notify about a failed action, preferring the server's own message.
    fn report(&self, error: &Error, fallback: &str) {
        if error.kind() == ErrorKind::Cancelled {
            tracing::debug!("Action cancelled with its view");
            return;
        }
        tracing::warn!("{}: {}", fallback, error);
        let message = error.server_message().unwrap_or(fallback);
        self.notifier.notify(NotifyKind::Error, message);
    }
}

async fn cancellable<T>(
    view: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = view.cancelled() => Err(Error::Cancelled),
        result = work => result,
    }
}
