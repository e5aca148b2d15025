// crates/sync-engine/src/memory.rs
//! In-memory collaborators
//!
//! Book databases, accounts, profiles and an annotation server that live
//! entirely in memory. Used by the test suites.

use crate::accounts::{Account, AccountEvent, Profile, ProfileEvent, ProfilesController};
use crate::error::{SyncError, SyncResult};
use crate::storage::{BookDatabase, FormatHandle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use pagemark_core::{
    AccountCredentials, AccountId, AccountPreferences, BookFormat, BookId, Bookmark, ProfileId,
};
use pagemark_network::{BookmarkHttpCalls, NetworkError, NetworkResult};
use pagemark_wire::{decode_annotation_list, BookmarkAnnotation};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bookmark storage of one book in one format
pub struct MemoryFormatHandle {
    format: BookFormat,
    bookmarks: Mutex<Vec<Bookmark>>,
    last_read: Mutex<Option<Bookmark>>,
}

impl MemoryFormatHandle {
    pub fn new(format: BookFormat) -> Self {
        Self {
            format,
            bookmarks: Mutex::new(Vec::new()),
            last_read: Mutex::new(None),
        }
    }
}

impl FormatHandle for MemoryFormatHandle {
    fn format(&self) -> BookFormat {
        self.format
    }

    fn bookmarks(&self) -> SyncResult<Vec<Bookmark>> {
        self.bookmarks
            .lock()
            .map(|bookmarks| bookmarks.clone())
            .map_err(|_| SyncError::lock_poisoned())
    }

    fn last_read_location(&self) -> SyncResult<Option<Bookmark>> {
        self.last_read
            .lock()
            .map(|last_read| last_read.clone())
            .map_err(|_| SyncError::lock_poisoned())
    }

    fn set_bookmarks(&self, bookmarks: Vec<Bookmark>) -> SyncResult<()> {
        *self.bookmarks.lock().map_err(|_| SyncError::lock_poisoned())? = bookmarks;
        Ok(())
    }

    fn set_last_read_location(&self, bookmark: Option<Bookmark>) -> SyncResult<()> {
        *self.last_read.lock().map_err(|_| SyncError::lock_poisoned())? = bookmark;
        Ok(())
    }
}

/// The books of one account
#[derive(Default)]
pub struct MemoryBookDatabase {
    books: Mutex<BTreeMap<BookId, HashMap<BookFormat, Arc<MemoryFormatHandle>>>>,
}

impl MemoryBookDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a format of a book, returning its handle.
    ///
    /// Adding a format that is already present returns the existing handle.
    pub fn add_book(&self, opds_id: &str, format: BookFormat) -> Arc<MemoryFormatHandle> {
        let mut books = relock(&self.books);
        let handle = books
            .entry(BookId::from_opds_id(opds_id))
            .or_default()
            .entry(format)
            .or_insert_with(|| Arc::new(MemoryFormatHandle::new(format)));
        Arc::clone(handle)
    }

    /// Removes every format of a book
    pub fn remove_book(&self, opds_id: &str) {
        relock(&self.books).remove(&BookId::from_opds_id(opds_id));
    }
}

impl BookDatabase for MemoryBookDatabase {
    fn books(&self) -> SyncResult<Vec<BookId>> {
        let books = self.books.lock().map_err(|_| SyncError::lock_poisoned())?;
        Ok(books.keys().cloned().collect())
    }

    fn format_handle(
        &self,
        book: &BookId,
        format: BookFormat,
    ) -> SyncResult<Option<Arc<dyn FormatHandle>>> {
        let books = self.books.lock().map_err(|_| SyncError::lock_poisoned())?;
        Ok(books
            .get(book)
            .and_then(|formats| formats.get(&format))
            .map(|handle| Arc::clone(handle) as Arc<dyn FormatHandle>))
    }
}

/// A library account held in memory
pub struct MemoryAccount {
    id: AccountId,
    credentials: Mutex<Option<AccountCredentials>>,
    settings_uri: Option<Url>,
    preferences: Mutex<AccountPreferences>,
    database: Arc<MemoryBookDatabase>,
}

impl MemoryAccount {
    /// A signed-out account with no books
    pub fn new() -> Self {
        Self {
            id: AccountId::new(),
            credentials: Mutex::new(None),
            settings_uri: None,
            preferences: Mutex::new(AccountPreferences::default()),
            database: Arc::new(MemoryBookDatabase::new()),
        }
    }

    pub fn with_credentials(mut self, credentials: AccountCredentials) -> Self {
        self.credentials = Mutex::new(Some(credentials));
        self
    }

    pub fn with_settings_uri(mut self, uri: Url) -> Self {
        self.settings_uri = Some(uri);
        self
    }

    pub fn with_preferences(mut self, preferences: AccountPreferences) -> Self {
        self.preferences = Mutex::new(preferences);
        self
    }

    /// The concrete book database, for adding books
    pub fn book_database_handle(&self) -> Arc<MemoryBookDatabase> {
        Arc::clone(&self.database)
    }

    /// Forgets the credentials
    pub fn sign_out(&self) {
        *relock(&self.credentials) = None;
    }
}

impl Default for MemoryAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Account for MemoryAccount {
    fn id(&self) -> AccountId {
        self.id
    }

    fn credentials(&self) -> Option<AccountCredentials> {
        relock(&self.credentials).clone()
    }

    fn set_credentials(&self, credentials: AccountCredentials) -> SyncResult<()> {
        *self.credentials.lock().map_err(|_| SyncError::lock_poisoned())? = Some(credentials);
        Ok(())
    }

    fn settings_uri(&self) -> Option<Url> {
        self.settings_uri.clone()
    }

    fn preferences(&self) -> AccountPreferences {
        *relock(&self.preferences)
    }

    fn set_preferences(&self, preferences: AccountPreferences) -> SyncResult<()> {
        *self.preferences.lock().map_err(|_| SyncError::lock_poisoned())? = preferences;
        Ok(())
    }

    fn book_database(&self) -> Arc<dyn BookDatabase> {
        Arc::clone(&self.database) as Arc<dyn BookDatabase>
    }
}

/// A reader profile held in memory
pub struct MemoryProfile {
    id: ProfileId,
    accounts: Mutex<Vec<Arc<MemoryAccount>>>,
}

impl MemoryProfile {
    pub fn new() -> Self {
        Self {
            id: ProfileId::new(),
            accounts: Mutex::new(Vec::new()),
        }
    }

    /// Adds an account and returns the shared handle to it
    pub fn add_account(&self, account: MemoryAccount) -> Arc<MemoryAccount> {
        let account = Arc::new(account);
        relock(&self.accounts).push(Arc::clone(&account));
        account
    }

    /// Removes an account
    pub fn remove_account(&self, id: AccountId) {
        relock(&self.accounts).retain(|account| account.id() != id);
    }
}

impl Default for MemoryProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl Profile for MemoryProfile {
    fn id(&self) -> ProfileId {
        self.id
    }

    fn accounts(&self) -> Vec<Arc<dyn Account>> {
        relock(&self.accounts)
            .iter()
            .map(|account| Arc::clone(account) as Arc<dyn Account>)
            .collect()
    }
}

/// A profile registry that publishes lifecycle events on demand
#[derive(Default)]
pub struct MemoryProfilesController {
    current: Mutex<Option<Arc<MemoryProfile>>>,
    profile_subscribers: Mutex<Vec<Sender<ProfileEvent>>>,
    account_subscribers: Mutex<Vec<Sender<AccountEvent>>>,
}

impl MemoryProfilesController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the profile current and announces the selection
    pub fn select_profile(&self, profile: Arc<MemoryProfile>) {
        let id = profile.id();
        *relock(&self.current) = Some(profile);
        self.publish_profile_event(ProfileEvent::SelectionInProgress(id));
        self.publish_profile_event(ProfileEvent::SelectionCompleted(id));
    }

    pub fn publish_profile_event(&self, event: ProfileEvent) {
        relock(&self.profile_subscribers).retain(|subscriber| subscriber.send(event).is_ok());
    }

    pub fn publish_account_event(&self, event: AccountEvent) {
        relock(&self.account_subscribers).retain(|subscriber| subscriber.send(event).is_ok());
    }
}

impl ProfilesController for MemoryProfilesController {
    fn profile_current(&self) -> SyncResult<Arc<dyn Profile>> {
        relock(&self.current)
            .as_ref()
            .map(|profile| Arc::clone(profile) as Arc<dyn Profile>)
            .ok_or(SyncError::NoCurrentProfile)
    }

    fn profile_events(&self) -> Receiver<ProfileEvent> {
        let (tx, rx) = unbounded();
        relock(&self.profile_subscribers).push(tx);
        rx
    }

    fn account_events(&self) -> Receiver<AccountEvent> {
        let (tx, rx) = unbounded();
        relock(&self.account_subscribers).push(tx);
        rx
    }
}

/// One call made against [`MemoryAnnotationServer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpCall {
    SyncingIsEnabled,
    SyncingEnable(bool),
    BookmarksGet,
    BookmarkAdd,
    BookmarkDelete,
}

#[derive(Default)]
struct ServerState {
    annotations: Vec<Value>,
    posted: Vec<Bookmark>,
    calls: Vec<HttpCall>,
    failing: HashSet<HttpCall>,
    next_id: u64,
    sync_permitted: bool,
}

impl ServerState {
    fn record(&mut self, call: HttpCall) -> NetworkResult<()> {
        self.calls.push(call);
        if self.failing.contains(&call) {
            return Err(NetworkError::Custom(format!("{:?} failed", call)));
        }
        Ok(())
    }

    fn assign_uri(&mut self) -> NetworkResult<Url> {
        self.next_id += 1;
        Url::parse(&format!("https://annotations.example/{}", self.next_id))
            .map_err(|e| NetworkError::Custom(e.to_string()))
    }
}

/// An annotation server that keeps annotations as JSON and records every call
pub struct MemoryAnnotationServer {
    state: Mutex<ServerState>,
}

impl MemoryAnnotationServer {
    /// An empty server that permits sync
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState {
                sync_permitted: true,
                ..ServerState::default()
            }),
        }
    }

    pub fn with_sync_permitted(self, permitted: bool) -> Self {
        relock(&self.state).sync_permitted = permitted;
        self
    }

    /// Makes every future call of this kind fail
    pub fn failing(self, call: HttpCall) -> Self {
        self.fail(call);
        self
    }

    pub fn fail(&self, call: HttpCall) {
        relock(&self.state).failing.insert(call);
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        relock(&self.state).calls.clone()
    }

    /// Bookmarks received through [`BookmarkHttpCalls::bookmark_add`]
    pub fn posted(&self) -> Vec<Bookmark> {
        relock(&self.state).posted.clone()
    }

    pub fn sync_permitted(&self) -> bool {
        relock(&self.state).sync_permitted
    }

    /// Number of stored annotations
    pub fn len(&self) -> usize {
        relock(&self.state).annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a bookmark without recording a call.
    ///
    /// Returns the bookmark as clients will receive it.
    pub fn store(&self, bookmark: Bookmark) -> NetworkResult<Bookmark> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        let uri = state.assign_uri()?;
        let annotation = BookmarkAnnotation::from_bookmark(&bookmark.with_uri(uri))?;
        let value = annotation.to_json()?;
        state.annotations.push(value);
        Ok(annotation.to_bookmark()?)
    }

    /// Stores an arbitrary item, decodable or not
    pub fn push_raw(&self, item: Value) {
        relock(&self.state).annotations.push(item);
    }
}

impl Default for MemoryAnnotationServer {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> NetworkError {
    NetworkError::Custom("Lock poisoned".to_string())
}

impl BookmarkHttpCalls for MemoryAnnotationServer {
    fn syncing_is_enabled(&self, _settings_uri: &Url, _credentials: &AccountCredentials) -> NetworkResult<bool> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.record(HttpCall::SyncingIsEnabled)?;
        Ok(state.sync_permitted)
    }

    fn syncing_enable(
        &self,
        _settings_uri: &Url,
        _credentials: &AccountCredentials,
        enabled: bool,
    ) -> NetworkResult<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.record(HttpCall::SyncingEnable(enabled))?;
        state.sync_permitted = enabled;
        Ok(())
    }

    fn bookmarks_get(&self, _annotations_uri: &Url, _credentials: &AccountCredentials) -> NetworkResult<Vec<Bookmark>> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.record(HttpCall::BookmarksGet)?;
        let list = decode_annotation_list(&json!({ "items": state.annotations }))?;
        for failure in &list.failures {
            log::warn!("unable to parse bookmark: {}", failure);
        }
        Ok(list.bookmarks)
    }

    fn bookmark_add(
        &self,
        _annotations_uri: &Url,
        _credentials: &AccountCredentials,
        bookmark: &Bookmark,
    ) -> NetworkResult<Url> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.record(HttpCall::BookmarkAdd)?;
        state.posted.push(bookmark.clone());
        let uri = state.assign_uri()?;
        let value = BookmarkAnnotation::from_bookmark(&bookmark.with_uri(uri.clone()))?.to_json()?;
        state.annotations.push(value);
        Ok(uri)
    }

    fn bookmark_delete(&self, bookmark_uri: &Url, _credentials: &AccountCredentials) -> NetworkResult<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.record(HttpCall::BookmarkDelete)?;
        let target = bookmark_uri.as_str();
        state
            .annotations
            .retain(|item| item.get("id").and_then(Value::as_str) != Some(target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{BookmarkKind, Locator};

    fn uri() -> Url {
        Url::parse("https://example.com/annotations/").unwrap()
    }

    fn credentials() -> AccountCredentials {
        AccountCredentials::bearer("t")
    }

    #[test]
    fn test_add_then_get_round_trips() {
        let server = MemoryAnnotationServer::new();
        let bookmark = Bookmark::new("urn:book:1", Locator::page(3).unwrap(), BookmarkKind::Explicit);

        let assigned = server.bookmark_add(&uri(), &credentials(), &bookmark).unwrap();
        let fetched = server.bookmarks_get(&uri(), &credentials()).unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].uri, Some(assigned));
        assert_eq!(fetched[0].bookmark_id(), bookmark.bookmark_id());
        assert_eq!(server.posted(), vec![bookmark]);
    }

    #[test]
    fn test_delete_removes_by_uri() {
        let server = MemoryAnnotationServer::new();
        let stored = server
            .store(Bookmark::new("urn:book:1", Locator::page(3).unwrap(), BookmarkKind::Explicit))
            .unwrap();
        let stored_uri = stored.uri.clone().unwrap();

        server.bookmark_delete(&stored_uri, &credentials()).unwrap();

        assert!(server.is_empty());
        assert_eq!(server.calls(), vec![HttpCall::BookmarkDelete]);
    }

    #[test]
    fn test_unparsable_items_are_skipped() {
        let server = MemoryAnnotationServer::new();
        server
            .store(Bookmark::new("urn:book:1", Locator::page(3).unwrap(), BookmarkKind::Explicit))
            .unwrap();
        server.push_raw(json!({ "garbage": true }));

        assert_eq!(server.bookmarks_get(&uri(), &credentials()).unwrap().len(), 1);
    }

    #[test]
    fn test_failing_calls_are_recorded() {
        let server = MemoryAnnotationServer::new().failing(HttpCall::SyncingEnable(false));

        assert!(server.syncing_enable(&uri(), &credentials(), false).is_err());
        assert!(server.syncing_enable(&uri(), &credentials(), true).is_ok());
        assert_eq!(
            server.calls(),
            vec![HttpCall::SyncingEnable(false), HttpCall::SyncingEnable(true)]
        );
        assert!(server.sync_permitted());
    }

    #[test]
    fn test_book_database_lists_books_once() {
        let database = MemoryBookDatabase::new();
        let first = database.add_book("urn:book:1", BookFormat::Epub);
        let again = database.add_book("urn:book:1", BookFormat::Epub);
        database.add_book("urn:book:1", BookFormat::Pdf);

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(database.books().unwrap().len(), 1);

        database.remove_book("urn:book:1");
        assert!(database.books().unwrap().is_empty());
    }

    #[test]
    fn test_select_profile_announces_selection() {
        let controller = MemoryProfilesController::new();
        let events = controller.profile_events();
        assert!(controller.profile_current().is_err());

        let profile = Arc::new(MemoryProfile::new());
        let id = profile.id();
        controller.select_profile(profile);

        assert_eq!(events.try_recv().unwrap(), ProfileEvent::SelectionInProgress(id));
        assert_eq!(events.try_recv().unwrap(), ProfileEvent::SelectionCompleted(id));
        assert_eq!(controller.profile_current().unwrap().id(), id);
    }
}
