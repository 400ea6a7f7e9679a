//! Local cache of diary entries, synchronized with the backend.
//!
//! The store never mutates optimistically: every change is applied only after
//! the backend confirms it, and a failed call leaves the collection as it was.

use crate::api::{CreateEntryRequest, DiaryBackend};
use crate::models::{DiaryEntry, EntryFields, EntryId};
use crate::session::{SessionManager, TokenStorage};
use crate::{Error, Result};

/// Ordered entries in server order, plus the currently selected entry.
pub struct EntryStore<B: DiaryBackend, S: TokenStorage> {
    backend: B,
    session: SessionManager<S>,
    entries: Vec<DiaryEntry>,
    selected: Option<EntryId>,
}

impl<B: DiaryBackend, S: TokenStorage> EntryStore<B, S> {
    pub const fn new(backend: B, session: SessionManager<S>) -> Self {
        Self {
            backend,
            session,
            entries: Vec::new(),
            selected: None,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &EntryId) -> Option<&DiaryEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the collection with the server's list, in server order.
    ///
    /// On failure the previous collection is kept.
    pub async fn fetch_all(&mut self) -> Result<&[DiaryEntry]> {
        let token = self.session.require_token()?;
        let entries = self.backend.list_entries(&token).await?;
        tracing::debug!("Fetched {} entries", entries.len());

        self.entries = entries;
        let selection_survives = self
            .selected
            .as_ref()
            .is_some_and(|id| self.entries.iter().any(|entry| &entry.id == id));
        if !selection_survives {
            self.selected = None;
        }
        Ok(&self.entries)
    }

    /// Create an entry and append the server's copy.
    pub async fn create(
        &mut self,
        title: &str,
        description: &str,
        media: Vec<String>,
    ) -> Result<DiaryEntry> {
        let fields = EntryFields::new(title, description)?;
        let token = self.session.require_token()?;
        let request = CreateEntryRequest::new(fields, media);

        let created = self.backend.create_entry(&token, &request).await?;
        tracing::info!("Created entry {}", created.id);
        self.entries.push(created.clone());
        Ok(created)
    }

    /// Update the title and description of a local entry in place.
    ///
    /// Media is not editable. Concurrent updates to the same id are not
    /// reconciled: whichever response arrives last is applied.
    pub async fn update(
        &mut self,
        id: &EntryId,
        title: &str,
        description: &str,
    ) -> Result<DiaryEntry> {
        if self.get(id).is_none() {
            return Err(Error::EntryNotFound(id.clone()));
        }
        let fields = EntryFields::new(title, description)?;
        let token = self.session.require_token()?;

        let updated = self.backend.update_entry(&token, id, &fields).await?;
        match self.entries.iter().position(|entry| &entry.id == id) {
            Some(position) => {
                tracing::info!("Updated entry {}", id);
                self.entries[position] = updated.clone();
            }
            None => tracing::warn!("Entry {} vanished during update; response dropped", id),
        }
        Ok(updated)
    }

    /// Delete an entry, clearing the selection when it pointed at it.
    pub async fn delete(&mut self, id: &EntryId) -> Result<()> {
        let token = self.session.require_token()?;
        self.backend.delete_entry(&token, id).await?;

        self.entries.retain(|entry| &entry.id != id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::info!("Deleted entry {}", id);
        Ok(())
    }

    /// Select a local entry for detail display.
    pub fn select(&mut self, id: &EntryId) -> Result<&DiaryEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.id == id)
            .ok_or_else(|| Error::EntryNotFound(id.clone()))?;
        self.selected = Some(id.clone());
        Ok(&self.entries[position])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&DiaryEntry> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Drop everything held in memory, e.g. on logout.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::MemoryTokenStorage;
    use crate::testing::{entry, FakeBackend, Op};

    fn signed_in_store(backend: &FakeBackend) -> EntryStore<FakeBackend, MemoryTokenStorage> {
        let session = SessionManager::new(MemoryTokenStorage::with_token("abc"));
        EntryStore::new(backend.clone(), session)
    }

    fn titles(store: &EntryStore<FakeBackend, MemoryTokenStorage>) -> Vec<&str> {
        store.entries().iter().map(|entry| entry.title.as_str()).collect()
    }

    #[tokio::test]
    async fn fetch_all_replaces_collection_in_server_order() {
        let backend = FakeBackend::with_entries(vec![entry("2", "B", "d"), entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);

        store.fetch_all().await.unwrap();
        assert_eq!(titles(&store), vec!["B", "A"]);

        backend.set_server_entries(vec![entry("3", "C", "d")]);
        store.fetch_all().await.unwrap();
        assert_eq!(titles(&store), vec!["C"]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_collection() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        backend.fail_next(Op::List, 500, "database offline");
        let error = store.fetch_all().await.unwrap_err();

        assert_eq!(error.server_message(), Some("database offline"));
        assert_eq!(titles(&store), vec!["A"]);
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let backend = FakeBackend::default();
        let mut store = signed_in_store(&backend);

        let created = store.create("T", "D", Vec::new()).await.unwrap();
        assert_eq!(store.entries().last(), Some(&created));

        store.fetch_all().await.unwrap();
        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched.title, "T");
        assert_eq!(fetched.description, "D");
        assert!(fetched.media.is_empty());
    }

    #[tokio::test]
    async fn create_appends_after_existing_entries() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        store
            .create("B", "d", vec!["https://assets.test/b.jpg".to_string()])
            .await
            .unwrap();

        assert_eq!(titles(&store), vec!["A", "B"]);
        assert_eq!(store.entries()[1].media, vec!["https://assets.test/b.jpg"]);
    }

    #[tokio::test]
    async fn create_with_empty_title_makes_no_request() {
        let backend = FakeBackend::default();
        let mut store = signed_in_store(&backend);

        let error = store.create("", "D", Vec::new()).await.unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));

        assert!(store.create("T", "   ", Vec::new()).await.is_err());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn failed_create_leaves_collection_unchanged() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        backend.fail_next(Op::Create, 400, "Title too long");
        let error = store.create("T", "D", Vec::new()).await.unwrap_err();

        assert_eq!(error.server_message(), Some("Title too long"));
        assert_eq!(titles(&store), vec!["A"]);
    }

    #[tokio::test]
    async fn update_replaces_only_the_target_in_place() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d"), entry("2", "B", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        store.update(&EntryId::from("1"), "A2", "D2").await.unwrap();

        assert_eq!(titles(&store), vec!["A2", "B"]);
        assert_eq!(store.entries()[0].description, "D2");
        assert_eq!(store.entries()[1], entry("2", "B", "d"));
    }

    #[tokio::test]
    async fn update_of_unknown_entry_makes_no_request() {
        let backend = FakeBackend::default();
        let mut store = signed_in_store(&backend);

        let error = store
            .update(&EntryId::from("missing"), "A", "B")
            .await
            .unwrap_err();

        assert!(matches!(error, Error::EntryNotFound(_)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn failed_update_leaves_entry_unchanged() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        backend.fail_next(Op::Update, 500, "boom");
        assert!(store.update(&EntryId::from("1"), "A2", "D2").await.is_err());
        assert_eq!(store.entries()[0], entry("1", "A", "d"));
    }

    #[tokio::test]
    async fn last_update_response_wins() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        store.update(&EntryId::from("1"), "Newer", "d").await.unwrap();
        backend.queue_update_response(entry("1", "Older", "d"));
        store.update(&EntryId::from("1"), "Ignored", "d").await.unwrap();

        assert_eq!(titles(&store), vec!["Older"]);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_clears_its_selection() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d"), entry("2", "B", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        store.select(&EntryId::from("1")).unwrap();
        store.delete(&EntryId::from("1")).await.unwrap();

        assert_eq!(titles(&store), vec!["B"]);
        assert!(store.selected().is_none());
    }

    #[tokio::test]
    async fn delete_of_other_entry_keeps_selection() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d"), entry("2", "B", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();

        store.select(&EntryId::from("2")).unwrap();
        store.delete(&EntryId::from("1")).await.unwrap();

        assert_eq!(store.selected().map(|entry| entry.title.as_str()), Some("B"));
    }

    #[tokio::test]
    async fn failed_delete_leaves_collection_unchanged() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();
        store.select(&EntryId::from("1")).unwrap();

        backend.fail_next(Op::Delete, 403, "Not your entry");
        assert!(store.delete(&EntryId::from("1")).await.is_err());

        assert_eq!(store.len(), 1);
        assert!(store.selected().is_some());
    }

    #[tokio::test]
    async fn refetch_drops_selection_that_no_longer_exists() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);
        store.fetch_all().await.unwrap();
        store.select(&EntryId::from("1")).unwrap();

        backend.set_server_entries(vec![entry("2", "B", "d")]);
        store.fetch_all().await.unwrap();

        assert!(store.selected().is_none());
    }

    #[tokio::test]
    async fn operations_without_token_make_no_request() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let session = SessionManager::new(MemoryTokenStorage::default());
        let mut store = EntryStore::new(backend.clone(), session);

        assert!(matches!(
            store.fetch_all().await.unwrap_err(),
            Error::NotAuthenticated
        ));
        assert!(matches!(
            store.create("T", "D", Vec::new()).await.unwrap_err(),
            Error::NotAuthenticated
        ));
        assert!(matches!(
            store.delete(&EntryId::from("1")).await.unwrap_err(),
            Error::NotAuthenticated
        ));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn clear_discards_entries_and_selection() {
        let backend = FakeBackend::with_entries(vec![entry("1", "A", "d")]);
        let mut store = signed_in_store(&backend);

        store.fetch_all().await.unwrap();
        store.select(&EntryId::from("1")).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert!(store.selected().is_none());
    }

    #[test]
    fn selecting_unknown_entry_fails() {
        let backend = FakeBackend::default();
        let mut store = signed_in_store(&backend);
        assert!(matches!(
            store.select(&EntryId::from("nope")),
            Err(Error::EntryNotFound(_))
        ));
    }
}
