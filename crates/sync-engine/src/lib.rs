// crates/sync-engine/src/lib.rs
//! Bookmark synchronization engine
//!
//! Keeps the bookmarks of every account of the current profile in step with
//! the library's annotation server:
//! - Two-way sync, periodically and on profile selection or login
//! - Creating and deleting bookmarks locally and remotely
//! - Enabling or disabling sync per account
//! - A live map of every known bookmark, readable from any thread
//!
//! All storage and network work runs on a single worker thread, one task at
//! a time. Callers get a [`TaskHandle`] they can await or block on.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{AccountCredentials, BookFormat, Bookmark, BookmarkKind, Locator};
//! use pagemark_sync_engine::memory::{
//!     MemoryAccount, MemoryAnnotationServer, MemoryProfile, MemoryProfilesController,
//! };
//! use pagemark_sync_engine::{Account, BookmarkService, BookmarkServiceConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use url::Url;
//!
//! let profile = Arc::new(MemoryProfile::new());
//! let account = profile.add_account(
//!     MemoryAccount::new()
//!         .with_credentials(
//!             AccountCredentials::bearer("token").with_annotations_uri(
//!                 Url::parse("https://example.com/annotations/").unwrap(),
//!             ),
//!         )
//!         .with_settings_uri(Url::parse("https://example.com/patrons/me/").unwrap()),
//! );
//! account.book_database_handle().add_book("urn:isbn:9780000000001", BookFormat::Epub);
//!
//! let profiles = Arc::new(MemoryProfilesController::new());
//! profiles.select_profile(profile);
//!
//! let config = BookmarkServiceConfig::default().with_initial_delay(Duration::from_secs(3600));
//! let service =
//!     BookmarkService::start(Arc::new(MemoryAnnotationServer::new()), profiles, config).unwrap();
//!
//! let bookmark = Bookmark::new(
//!     "urn:isbn:9780000000001",
//!     Locator::href_progression("/chapter1.xhtml", 0.5).unwrap(),
//!     BookmarkKind::Explicit,
//! );
//! let created = service.create(account.id(), bookmark, false).wait().unwrap();
//! assert!(created.uri.is_some());
//! ```

mod accounts;
mod attributes;
mod error;
mod events;
pub mod memory;
mod normalize;
mod ops;
mod service;
mod status;
mod storage;
mod types;
mod worker;

pub use accounts::{
    token_refresh_handler, Account, AccountEvent, Profile, ProfileEvent, ProfilesController,
    SyncableAccount,
};
pub use attributes::{BookmarkAttributes, BookmarkMap};
pub use error::{SyncError, SyncResult};
pub use events::EventBus;
pub use normalize::{local_extras, normalize};
pub use service::{BookmarkService, BookmarkServiceConfig};
pub use status::{ChangingAccounts, ChangingGuard};
pub use storage::{BookDatabase, FormatHandle};
pub use types::{BookmarkEvent, BookmarkSyncEnableStatus, BookmarksForBook, SyncEnableResult};
pub use worker::TaskHandle;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAnnotationServer, MemoryProfilesController};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_all_exports_accessible() {
        let _: EventBus = EventBus::new();
        let _: BookmarkAttributes = BookmarkAttributes::new();
        let _: ChangingAccounts = ChangingAccounts::new();
        let _: BookmarkServiceConfig = BookmarkServiceConfig::default();
        let _: SyncEnableResult = SyncEnableResult::from_permitted(true);

        let config = BookmarkServiceConfig::default().with_initial_delay(Duration::from_secs(3600));
        let service = BookmarkService::start(
            Arc::new(MemoryAnnotationServer::new()),
            Arc::new(MemoryProfilesController::new()),
            config,
        )
        .unwrap();
        let _: TaskHandle<()> = service.sync_all();
    }
}
