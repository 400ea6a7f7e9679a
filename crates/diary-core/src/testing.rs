//! In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::api::{AuthToken, CreateEntryRequest, DiaryBackend, LoginRequest, RegisterRequest};
use crate::controller::{Notifier, NotifyKind};
use crate::media::{AssetHost, UploadedAsset};
use crate::models::{DiaryEntry, EntryFields, EntryId, ImageSelection, UserProfile};
use crate::session::{Route, Router};
use crate::{Error, Result};

pub fn entry(id: &str, title: &str, description: &str) -> DiaryEntry {
    DiaryEntry {
        id: EntryId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        media: Vec::new(),
        created_at: Utc
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .single()
            .unwrap_or_default(),
    }
}

pub fn image(file_name: &str) -> ImageSelection {
    ImageSelection::new(file_name, Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF]).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    Register,
    Profile,
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug)]
struct BackendState {
    entries: Vec<DiaryEntry>,
    requests: Vec<Op>,
    created: Vec<CreateEntryRequest>,
    failures: HashMap<Op, (u16, String)>,
    update_responses: VecDeque<DiaryEntry>,
    profile: UserProfile,
    next_id: u32,
    delay: Option<Duration>,
}

/// Backend holding entries in memory. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::with_entries(Vec::new())
    }
}

impl FakeBackend {
    pub fn with_entries(entries: Vec<DiaryEntry>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState {
                entries,
                requests: Vec::new(),
                created: Vec::new(),
                failures: HashMap::new(),
                update_responses: VecDeque::new(),
                profile: UserProfile {
                    id: "user-1".to_string(),
                    username: Some("tester".to_string()),
                },
                next_id: 100,
                delay: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<Op> {
        self.lock().requests.clone()
    }

    pub fn created_requests(&self) -> Vec<CreateEntryRequest> {
        self.lock().created.clone()
    }

    pub fn server_entries(&self) -> Vec<DiaryEntry> {
        self.lock().entries.clone()
    }

    pub fn set_server_entries(&self, entries: Vec<DiaryEntry>) {
        self.lock().entries = entries;
    }

    /// Fail the next call of `op`. An empty message means a bodiless error.
    pub fn fail_next(&self, op: Op, status: u16, message: &str) {
        self.lock().failures.insert(op, (status, message.to_string()));
    }

    pub fn fail_next_profile(&self, status: u16, message: &str) {
        self.fail_next(Op::Profile, status, message);
    }

    /// Answer the next update with `entry` instead of the stored result.
    pub fn queue_update_response(&self, entry: DiaryEntry) {
        self.lock().update_responses.push_back(entry);
    }

    /// Delay every response, leaving room to cancel in-flight calls.
    pub fn delay_responses(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    async fn begin(&self, op: Op) -> Result<()> {
        let delay = {
            let mut state = self.lock();
            state.requests.push(op);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.lock().failures.remove(&op) {
            Some((status, message)) => Err(Error::Api {
                status,
                message: (!message.is_empty()).then_some(message),
            }),
            None => Ok(()),
        }
    }
}

impl DiaryBackend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthToken> {
        self.begin(Op::Login).await?;
        AuthToken::new(format!("token-for-{}", request.email))
            .ok_or_else(|| Error::MalformedResponse("empty token".to_string()))
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<()> {
        self.begin(Op::Register).await
    }

    async fn current_user(&self, _token: &AuthToken) -> Result<UserProfile> {
        self.begin(Op::Profile).await?;
        Ok(self.lock().profile.clone())
    }

    async fn list_entries(&self, _token: &AuthToken) -> Result<Vec<DiaryEntry>> {
        self.begin(Op::List).await?;
        Ok(self.lock().entries.clone())
    }

    async fn create_entry(
        &self,
        _token: &AuthToken,
        request: &CreateEntryRequest,
    ) -> Result<DiaryEntry> {
        self.begin(Op::Create).await?;
        let mut state = self.lock();
        state.next_id += 1;
        let mut created = entry(
            &format!("srv-{}", state.next_id),
            &request.title,
            &request.description,
        );
        created.media.clone_from(&request.media);
        state.created.push(request.clone());
        state.entries.push(created.clone());
        Ok(created)
    }

    async fn update_entry(
        &self,
        _token: &AuthToken,
        id: &EntryId,
        fields: &EntryFields,
    ) -> Result<DiaryEntry> {
        self.begin(Op::Update).await?;
        let mut state = self.lock();
        if let Some(queued) = state.update_responses.pop_front() {
            return Ok(queued);
        }
        let stored = state
            .entries
            .iter_mut()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| Error::Api {
                status: 404,
                message: Some("Entry not found".to_string()),
            })?;
        stored.title.clone_from(&fields.title);
        stored.description.clone_from(&fields.description);
        Ok(stored.clone())
    }

    async fn delete_entry(&self, _token: &AuthToken, id: &EntryId) -> Result<()> {
        self.begin(Op::Delete).await?;
        self.lock().entries.retain(|entry| &entry.id != id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HostState {
    uploaded: Vec<String>,
    discarded: Vec<String>,
    failing: HashSet<String>,
    slow: HashMap<String, Duration>,
    fail_discards: bool,
    without_delete_tokens: bool,
}

/// Asset host that records uploads and discards. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeAssetHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeAssetHost {
    pub fn without_delete_tokens() -> Self {
        let host = Self::default();
        host.lock().without_delete_tokens = true;
        host
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_upload_of(&self, file_name: &str) {
        self.lock().failing.insert(file_name.to_string());
    }

    /// Hold the upload of `file_name` for `delay` before it completes.
    pub fn delay_upload_of(&self, file_name: &str, delay: Duration) {
        self.lock().slow.insert(file_name.to_string(), delay);
    }

    pub fn fail_discards(&self) {
        self.lock().fail_discards = true;
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.lock().uploaded.clone()
    }

    pub fn discarded_urls(&self) -> Vec<String> {
        self.lock().discarded.clone()
    }
}

impl AssetHost for FakeAssetHost {
    async fn upload(&self, image: &ImageSelection) -> Result<UploadedAsset> {
        let delay = self.lock().slow.get(&image.file_name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        state.uploaded.push(image.file_name.clone());
        if state.failing.contains(&image.file_name) {
            return Err(Error::Api {
                status: 400,
                message: Some(format!("host rejected {}", image.file_name)),
            });
        }
        Ok(UploadedAsset {
            url: format!("https://assets.test/{}", image.file_name),
            delete_token: (!state.without_delete_tokens)
                .then(|| format!("dt-{}", image.file_name)),
        })
    }

    async fn discard(&self, asset: &UploadedAsset) -> Result<()> {
        let mut state = self.lock();
        if state.fail_discards {
            return Err(Error::Api {
                status: 500,
                message: None,
            });
        }
        state.discarded.push(asset.url.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingRouter {
    routes: Mutex<Vec<Route>>,
}

impl RecordingRouter {
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Router for RecordingRouter {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(NotifyKind, String)>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(NotifyKind, String)> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, message.to_string()));
    }
}
