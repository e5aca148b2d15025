// crates/sync-engine/src/service.rs
//! The bookmark service
//!
//! Owns the worker, a timer that syncs the current profile periodically, and
//! a listener that reacts to profile and account events. Every public
//! operation returns a [`TaskHandle`] immediately.

use crate::accounts::{AccountEvent, Profile, ProfileEvent, ProfilesController, SyncableAccount};
use crate::attributes::BookmarkAttributes;
use crate::error::{SyncError, SyncResult};
use crate::events::EventBus;
use crate::ops::create::{create_bookmark, create_local_bookmark, create_remote_bookmark};
use crate::ops::delete::delete_bookmark;
use crate::ops::load::{load_bookmarks_for_all, load_bookmarks_for_book};
use crate::ops::settings::{check_sync_status_for_account, check_sync_status_for_profile, enable_sync};
use crate::ops::sync::{sync_all_accounts, sync_one_account};
use crate::status::{sync_status, ChangingAccounts};
use crate::types::{
    BookmarkEvent, BookmarkSyncEnableStatus, BookmarksForBook, SyncEnableResult,
};
use crate::worker::{TaskHandle, WorkQueue, Worker, WorkerContext, WorkerParts};
use crossbeam_channel::{bounded, never, select, Receiver, RecvError, RecvTimeoutError, Sender};
use pagemark_core::{AccountId, BookId, Bookmark};
use pagemark_network::BookmarkHttpCalls;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Timing of the periodic sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkServiceConfig {
    /// Run the periodic sync at all; event-driven syncs happen regardless
    pub periodic: bool,
    /// Time between periodic syncs
    pub sync_interval: Duration,
    /// Time before the first periodic sync
    pub initial_delay: Duration,
}

impl Default for BookmarkServiceConfig {
    fn default() -> Self {
        Self {
            periodic: true,
            sync_interval: Duration::from_secs(3600),
            initial_delay: Duration::ZERO,
        }
    }
}

impl BookmarkServiceConfig {
    pub fn with_periodic_sync(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

/// Synchronizes bookmarks of the current profile with the annotation server
pub struct BookmarkService {
    profiles: Arc<dyn ProfilesController>,
    events: EventBus,
    attributes: BookmarkAttributes,
    changing: ChangingAccounts,
    worker: Worker,
    shutdown: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
}

impl BookmarkService {
    /// Starts the worker, the periodic timer and the event listener
    pub fn start(
        http: Arc<dyn BookmarkHttpCalls>,
        profiles: Arc<dyn ProfilesController>,
        config: BookmarkServiceConfig,
    ) -> SyncResult<Self> {
        let parts = WorkerParts {
            http,
            events: EventBus::new(),
            attributes: BookmarkAttributes::new(),
            changing: ChangingAccounts::new(),
        };
        let worker = Worker::start(parts.clone())?;
        let queue = worker.queue().ok_or(SyncError::WorkerStopped)?;
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let profile_events = profiles.profile_events();
        let account_events = profiles.account_events();

        let mut service = Self {
            profiles: Arc::clone(&profiles),
            events: parts.events,
            attributes: parts.attributes,
            changing: parts.changing,
            worker,
            shutdown: Some(shutdown_tx),
            threads: Vec::new(),
        };

        let timer = {
            let queue = queue.clone();
            let profiles = Arc::clone(&profiles);
            let shutdown = shutdown_rx.clone();
            thread::Builder::new()
                .name("pagemark-timer".to_string())
                .spawn(move || timer_loop(queue, profiles, shutdown, config))
        };
        match timer {
            Ok(handle) => service.threads.push(handle),
            Err(e) => {
                service.close();
                return Err(SyncError::Custom(format!("Failed to start timer: {}", e)));
            }
        }

        let listener = thread::Builder::new()
            .name("pagemark-events".to_string())
            .spawn(move || {
                listen_loop(queue, profiles, profile_events, account_events, shutdown_rx)
            });
        match listener {
            Ok(handle) => service.threads.push(handle),
            Err(e) => {
                service.close();
                return Err(SyncError::Custom(format!("Failed to start listener: {}", e)));
            }
        }

        if config.periodic {
            log::info!(
                "bookmark service started (sync every {}s)",
                config.sync_interval.as_secs()
            );
        } else {
            log::info!("bookmark service started (periodic sync off)");
        }
        Ok(service)
    }

    /// Subscribes to bookmark events
    pub fn events(&self) -> Receiver<BookmarkEvent> {
        self.events.subscribe()
    }

    /// The live bookmark attribute map
    pub fn bookmarks(&self) -> BookmarkAttributes {
        self.attributes.clone()
    }

    /// Sync setting state of an account, answered without the worker
    pub fn sync_status(&self, account_id: AccountId) -> SyncResult<BookmarkSyncEnableStatus> {
        let profile = self.profiles.profile_current()?;
        sync_status(&*profile, account_id, &self.changing)
    }

    /// Turns sync on or off for an account, then syncs the profile.
    ///
    /// The account reports [`BookmarkSyncEnableStatus::Changing`] until the
    /// server has answered.
    pub fn sync_enable(&self, account_id: AccountId, enabled: bool) -> TaskHandle<SyncEnableResult> {
        let profile = match self.profiles.profile_current() {
            Ok(profile) => profile,
            Err(e) => return TaskHandle::failed(e),
        };
        let account = match profile.account(account_id) {
            Ok(account) => account,
            Err(e) => return TaskHandle::failed(e),
        };

        let Some(syncable) = SyncableAccount::of_account(&account) else {
            log::debug!("[{}]: account {} does not support syncing", profile.id(), account_id);
            self.publish_status(BookmarkSyncEnableStatus::Changing { account_id });
            self.publish_status(BookmarkSyncEnableStatus::Idle {
                account_id,
                status: SyncEnableResult::NotSupported,
            });
            return TaskHandle::ready(Ok(SyncEnableResult::NotSupported));
        };

        let guard = match self.changing.mark(account_id) {
            Ok(guard) => guard,
            Err(e) => return TaskHandle::failed(e),
        };
        self.publish_status(BookmarkSyncEnableStatus::Changing { account_id });

        let handle = self.worker.submit(move |context| {
            let result = enable_sync(context, &*profile, &syncable, enabled, guard);
            check_sync_status_for_profile(context, &*profile);
            result
        });
        self.sync_all();
        handle
    }

    fn publish_status(&self, status: BookmarkSyncEnableStatus) {
        self.events.publish(BookmarkEvent::SyncSettingChanged {
            account_id: status.account_id(),
            status,
        });
    }

    /// Re-reads the sync permission of one account from the server
    pub fn check_sync_status(&self, account_id: AccountId) -> TaskHandle<()> {
        self.submit_with_profile(move |context, profile| {
            let account = profile.account(account_id)?;
            if let Some(syncable) = SyncableAccount::of_account(&account) {
                check_sync_status_for_account(context, profile, &syncable);
            }
            Ok(())
        })
    }

    /// Re-reads the sync permission of every account
    pub fn check_sync_status_for_profile(&self) -> TaskHandle<()> {
        self.submit_with_profile(|context, profile| {
            check_sync_status_for_profile(context, profile);
            Ok(())
        })
    }

    /// Syncs one account, returning the bookmarks the server sent
    pub fn sync_account(&self, account_id: AccountId) -> TaskHandle<Vec<Bookmark>> {
        self.submit_with_profile(move |context, profile| sync_one_account(context, profile, account_id))
    }

    /// Syncs every account of the current profile
    pub fn sync_all(&self) -> TaskHandle<()> {
        match self.worker.queue() {
            Some(queue) => submit_sync_all(&queue, &*self.profiles),
            None => TaskHandle::failed(SyncError::WorkerStopped),
        }
    }

    /// Syncs an account, then loads one of its books.
    ///
    /// A failed sync still loads whatever is stored locally.
    pub fn sync_and_load(&self, account_id: AccountId, book_id: BookId) -> TaskHandle<BookmarksForBook> {
        self.submit_with_profile(move |context, profile| {
            if let Err(e) = sync_one_account(context, profile, account_id) {
                log::error!("[{}]: error syncing account {}: {}", profile.id(), account_id, e);
            }
            Ok(load_bookmarks_for_book(context, profile, account_id, &book_id))
        })
    }

    /// Loads the bookmarks of a book; never fails
    pub fn load(&self, account_id: AccountId, book_id: BookId) -> TaskHandle<BookmarksForBook> {
        let profile = match self.profiles.profile_current() {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("unable to load bookmarks: {}", e);
                return TaskHandle::ready(Ok(BookmarksForBook::empty(book_id)));
            }
        };
        self.worker.submit(move |context| {
            Ok(load_bookmarks_for_book(context, &*profile, account_id, &book_id))
        })
    }

    /// Loads every book of the current profile into the attribute map
    pub fn load_all(&self) -> TaskHandle<()> {
        self.submit_with_profile(|context, profile| {
            load_bookmarks_for_all(context, profile);
            Ok(())
        })
    }

    /// Saves a bookmark locally only
    pub fn create_local(&self, account_id: AccountId, bookmark: Bookmark) -> TaskHandle<Bookmark> {
        self.submit_with_profile(move |context, profile| {
            create_local_bookmark(context, profile, account_id, bookmark)
        })
    }

    /// Uploads a bookmark only
    pub fn create_remote(&self, account_id: AccountId, bookmark: Bookmark) -> TaskHandle<Bookmark> {
        self.submit_with_profile(move |context, profile| {
            create_remote_bookmark(context, profile, account_id, bookmark)
        })
    }

    /// Uploads a bookmark, then saves it locally
    pub fn create(
        &self,
        account_id: AccountId,
        bookmark: Bookmark,
        ignore_remote_failures: bool,
    ) -> TaskHandle<Bookmark> {
        self.submit_with_profile(move |context, profile| {
            create_bookmark(context, profile, account_id, bookmark, ignore_remote_failures)
        })
    }

    /// Deletes a bookmark remotely, then locally
    pub fn delete(
        &self,
        account_id: AccountId,
        bookmark: Bookmark,
        ignore_remote_failures: bool,
    ) -> TaskHandle<()> {
        self.submit_with_profile(move |context, profile| {
            delete_bookmark(context, profile, account_id, &bookmark, ignore_remote_failures)
        })
    }

    fn submit_with_profile<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut WorkerContext, &dyn Profile) -> SyncResult<T> + Send + 'static,
    {
        match self.profiles.profile_current() {
            Ok(profile) => self.worker.submit(move |context| task(context, &*profile)),
            Err(e) => TaskHandle::failed(e),
        }
    }

    /// Stops the timer and listener, runs the queued work, then stops the worker.
    ///
    /// Operations submitted afterwards fail with [`SyncError::WorkerStopped`].
    pub fn close(&mut self) {
        if self.shutdown.take().is_none() {
            return;
        }
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::error!("bookmark service thread panicked");
            }
        }
        self.worker.stop();
        log::info!("bookmark service stopped");
    }
}

impl Drop for BookmarkService {
    fn drop(&mut self) {
        self.close();
    }
}

fn submit_sync_all(queue: &WorkQueue, profiles: &dyn ProfilesController) -> TaskHandle<()> {
    match profiles.profile_current() {
        Ok(profile) => queue.submit(move |context| sync_all_accounts(context, &*profile)),
        Err(e) => {
            log::debug!("unable to sync profile: {}", e);
            TaskHandle::failed(e)
        }
    }
}

fn timer_loop(
    queue: WorkQueue,
    profiles: Arc<dyn ProfilesController>,
    shutdown: Receiver<()>,
    config: BookmarkServiceConfig,
) {
    if !config.periodic {
        let _ = shutdown.recv();
        return;
    }
    let mut wait = config.initial_delay;
    loop {
        match shutdown.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("regular sync time elapsed");
                submit_sync_all(&queue, &*profiles);
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        wait = config.sync_interval;
    }
}

enum Wake {
    Profile(Result<ProfileEvent, RecvError>),
    Account(Result<AccountEvent, RecvError>),
    Shutdown,
}

fn listen_loop(
    queue: WorkQueue,
    profiles: Arc<dyn ProfilesController>,
    mut profile_events: Receiver<ProfileEvent>,
    mut account_events: Receiver<AccountEvent>,
    shutdown: Receiver<()>,
) {
    loop {
        let wake = select! {
            recv(profile_events) -> event => Wake::Profile(event),
            recv(account_events) -> event => Wake::Account(event),
            recv(shutdown) -> _ => Wake::Shutdown,
        };

        match wake {
            Wake::Profile(Ok(ProfileEvent::SelectionInProgress(id))) => {
                log::debug!("[{}]: a new profile was selected", id);
                submit_sync_all(&queue, &*profiles);
            }
            Wake::Profile(Ok(ProfileEvent::SelectionCompleted(_))) => {}
            Wake::Account(Ok(AccountEvent::LoggedIn(id))) => {
                log::debug!("[{}]: account logged in", id);
                submit_sync_all(&queue, &*profiles);
            }
            Wake::Account(Ok(AccountEvent::LoggedOut(id) | AccountEvent::Deleted(id))) => {
                log::debug!("[{}]: forgetting bookmarks of account", id);
                queue.submit(move |context| context.attributes.remove_account(id));
            }
            Wake::Account(Ok(
                AccountEvent::LoggingIn(_) | AccountEvent::LoginFailed(_),
            )) => {}
            Wake::Profile(Err(_)) => profile_events = never(),
            Wake::Account(Err(_)) => account_events = never(),
            Wake::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_to_hourly() {
        let config = BookmarkServiceConfig::default();
        assert_eq!(config.sync_interval, Duration::from_secs(3600));
        assert_eq!(config.initial_delay, Duration::ZERO);

        let custom = config
            .with_sync_interval(Duration::from_secs(60))
            .with_initial_delay(Duration::from_secs(5));
        assert_eq!(custom.sync_interval, Duration::from_secs(60));
        assert_eq!(custom.initial_delay, Duration::from_secs(5));
    }
}
