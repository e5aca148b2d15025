// crates/sync-engine/src/types.rs
//! Events, sync status and per-book bookmark sets

use pagemark_core::{AccountId, BookId, Bookmark, BookmarkKind};
use std::fmt;

/// Outcome of enabling or disabling sync for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEnableResult {
    /// Sync is enabled
    Enabled,
    /// Sync is disabled
    Disabled,
    /// The account cannot sync bookmarks at all
    NotSupported,
}

impl SyncEnableResult {
    /// Maps a permission flag to a result
    pub fn from_permitted(permitted: bool) -> Self {
        if permitted {
            SyncEnableResult::Enabled
        } else {
            SyncEnableResult::Disabled
        }
    }
}

impl fmt::Display for SyncEnableResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncEnableResult::Enabled => "enabled",
            SyncEnableResult::Disabled => "disabled",
            SyncEnableResult::NotSupported => "not supported",
        };
        write!(f, "{}", name)
    }
}

/// Sync setting state of an account as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkSyncEnableStatus {
    /// No change is in flight
    Idle {
        account_id: AccountId,
        status: SyncEnableResult,
    },
    /// An enable or disable request is in flight
    Changing { account_id: AccountId },
}

impl BookmarkSyncEnableStatus {
    pub fn account_id(&self) -> AccountId {
        match self {
            BookmarkSyncEnableStatus::Idle { account_id, .. } => *account_id,
            BookmarkSyncEnableStatus::Changing { account_id } => *account_id,
        }
    }
}

/// Events broadcast by the bookmark service
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkEvent {
    /// A bookmark was written to local storage
    Saved {
        account_id: AccountId,
        bookmark: Bookmark,
    },
    /// Remote sync for an account started
    SyncStarted { account_id: AccountId },
    /// Remote sync for an account finished
    SyncFinished { account_id: AccountId },
    /// The sync setting of an account changed or started changing
    SyncSettingChanged {
        account_id: AccountId,
        status: BookmarkSyncEnableStatus,
    },
}

impl BookmarkEvent {
    /// The account this event concerns
    pub fn account_id(&self) -> AccountId {
        match self {
            BookmarkEvent::Saved { account_id, .. }
            | BookmarkEvent::SyncStarted { account_id }
            | BookmarkEvent::SyncFinished { account_id }
            | BookmarkEvent::SyncSettingChanged { account_id, .. } => *account_id,
        }
    }
}

/// The bookmarks of one book: the last-read slot plus explicit bookmarks
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarksForBook {
    pub book_id: BookId,
    pub last_read: Option<Bookmark>,
    pub bookmarks: Vec<Bookmark>,
}

impl BookmarksForBook {
    /// Builds a set, dropping anything that does not belong in it.
    ///
    /// Explicit bookmarks must be of kind explicit and the last-read slot of
    /// kind last-read, and all must belong to `book_id`.
    pub fn new(book_id: BookId, last_read: Option<Bookmark>, bookmarks: Vec<Bookmark>) -> Self {
        let last_read = last_read
            .filter(|b| b.kind == BookmarkKind::LastReadLocation && b.book_id() == book_id);
        let bookmarks = bookmarks
            .into_iter()
            .filter(|b| b.kind == BookmarkKind::Explicit && b.book_id() == book_id)
            .collect();
        Self {
            book_id,
            last_read,
            bookmarks,
        }
    }

    /// A set with nothing in it
    pub fn empty(book_id: BookId) -> Self {
        Self {
            book_id,
            last_read: None,
            bookmarks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_read.is_none() && self.bookmarks.is_empty()
    }
}
