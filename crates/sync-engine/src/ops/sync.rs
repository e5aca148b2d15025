// crates/sync-engine/src/ops/sync.rs
//! Two-way sync of an account's bookmarks with the annotation server

use crate::accounts::{Profile, SyncableAccount};
use crate::error::SyncResult;
use crate::normalize::local_extras;
use crate::ops::settings::check_sync_status_for_account;
use crate::storage::BookDatabase;
use crate::types::BookmarkEvent;
use crate::worker::WorkerContext;
use pagemark_core::{AccountId, BookId, Bookmark, BookmarkKind};
use std::collections::HashSet;

/// Syncs one account and returns the bookmarks received from the server.
///
/// Accounts that cannot sync, or whose patron has not permitted it, yield an
/// empty list without error. A failed fetch of the remote list is logged and
/// treated as an empty list, so local extras are still pushed. Individual
/// bookmarks that fail to store or upload are logged and skipped.
pub(crate) fn sync_one_account(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
) -> SyncResult<Vec<Bookmark>> {
    log::debug!("[{}]: syncing account {}", profile.id(), account_id);

    let account = profile.account(account_id)?;
    let Some(syncable) = SyncableAccount::of_account(&account) else {
        log::debug!("[{}]: account {} is not syncable", profile.id(), account_id);
        return Ok(Vec::new());
    };

    check_sync_status_for_account(context, profile, &syncable);
    if !syncable.account.preferences().bookmark_syncing_permitted {
        log::debug!("[{}]: syncing not permitted for account {}", profile.id(), account_id);
        return Ok(Vec::new());
    }

    context.events.publish(BookmarkEvent::SyncStarted { account_id });
    let outcome = exchange(context, profile, &syncable);
    context.events.publish(BookmarkEvent::SyncFinished { account_id });
    outcome
}

fn exchange(
    context: &WorkerContext,
    profile: &dyn Profile,
    syncable: &SyncableAccount,
) -> SyncResult<Vec<Bookmark>> {
    let received = receive_bookmarks(context, profile, syncable)?;
    send_local_extras(context, profile, syncable, &received);
    Ok(received)
}

fn receive_bookmarks(
    context: &WorkerContext,
    profile: &dyn Profile,
    syncable: &SyncableAccount,
) -> SyncResult<Vec<Bookmark>> {
    let account_id = syncable.id();
    let remote = match context
        .http
        .bookmarks_get(&syncable.annotations_uri, &syncable.credentials)
    {
        Ok(remote) => remote,
        Err(e) => {
            log::error!(
                "[{}]: could not receive bookmarks for account {}: {}",
                profile.id(),
                account_id,
                e
            );
            return Ok(Vec::new());
        }
    };
    log::debug!("[{}]: received {} bookmarks", profile.id(), remote.len());

    let database = syncable.account.book_database();
    let held: HashSet<BookId> = database.books()?.into_iter().collect();

    let mut results = Vec::with_capacity(remote.len());
    for bookmark in remote {
        let book_id = bookmark.book_id();
        if !held.contains(&book_id) {
            log::debug!("[{}]: we no longer have book {}", profile.id(), book_id);
            continue;
        }

        match store_received(context, &*database, account_id, &bookmark) {
            Ok(()) => {
                log::debug!("[{}]: received bookmark {}", profile.id(), bookmark.bookmark_id());
                results.push(bookmark);
            }
            Err(e) => log::error!(
                "[{}]: could not store bookmark for account {}: {}",
                profile.id(),
                account_id,
                e
            ),
        }
    }
    Ok(results)
}

fn store_received(
    context: &WorkerContext,
    database: &dyn BookDatabase,
    account_id: AccountId,
    bookmark: &Bookmark,
) -> SyncResult<()> {
    for handle in database.format_handles(&bookmark.book_id())? {
        match bookmark.kind {
            BookmarkKind::Explicit => handle.add_bookmark(bookmark.clone())?,
            BookmarkKind::LastReadLocation => handle.set_last_read_location(Some(bookmark.clone()))?,
        }
    }
    context.attributes.add_bookmark(account_id, bookmark)?;
    context.events.publish(BookmarkEvent::Saved {
        account_id,
        bookmark: bookmark.clone(),
    });
    Ok(())
}

fn send_local_extras(
    context: &WorkerContext,
    profile: &dyn Profile,
    syncable: &SyncableAccount,
    received: &[Bookmark],
) {
    let local = match local_explicit_bookmarks(&*syncable.account.book_database()) {
        Ok(local) => local,
        Err(e) => {
            log::error!("[{}]: could not read local bookmarks: {}", profile.id(), e);
            return;
        }
    };

    let extras = local_extras(&local, received);
    log::debug!(
        "[{}]: we have {} bookmarks the server did not have",
        profile.id(),
        extras.len()
    );

    for bookmark in extras {
        log::debug!("[{}]: sending bookmark {}", profile.id(), bookmark.bookmark_id());
        if let Err(e) =
            context
                .http
                .bookmark_add(&syncable.annotations_uri, &syncable.credentials, &bookmark)
        {
            log::error!("[{}]: error sending bookmark: {}", profile.id(), e);
        }
    }
}

fn local_explicit_bookmarks(database: &dyn BookDatabase) -> SyncResult<Vec<Bookmark>> {
    let mut bookmarks = Vec::new();
    for book in database.books()? {
        for handle in database.format_handles(&book)? {
            bookmarks.extend(handle.bookmarks()?.into_iter().filter(Bookmark::is_explicit));
        }
    }
    Ok(bookmarks)
}

/// Syncs every account of the profile; one account failing does not stop
/// the others.
pub(crate) fn sync_all_accounts(context: &WorkerContext, profile: &dyn Profile) -> SyncResult<()> {
    for account in profile.accounts() {
        if let Err(e) = sync_one_account(context, profile, account.id()) {
            log::error!("[{}]: failed to sync account {}: {}", profile.id(), account.id(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Account;
    use crate::memory::{HttpCall, MemoryAnnotationServer};
    use crate::ops::tests::{context_with, syncable_account};
    use crate::storage::FormatHandle;
    use pagemark_core::{BookFormat, Locator};
    use std::sync::Arc;

    fn explicit(opds_id: &str, progress: f64) -> Bookmark {
        Bookmark::new(
            opds_id,
            Locator::href_progression("/ch1.xhtml", progress).unwrap(),
            BookmarkKind::Explicit,
        )
    }

    #[test]
    fn test_not_permitted_makes_no_bookmark_calls() {
        let server = Arc::new(MemoryAnnotationServer::new().with_sync_permitted(false));
        let context = context_with(&server);
        let (profile, account) = syncable_account(true);

        let received = sync_one_account(&context, &*profile, account.id()).unwrap();

        assert!(received.is_empty());
        assert_eq!(server.calls(), vec![HttpCall::SyncingIsEnabled]);
    }

    #[test]
    fn test_merges_remote_and_pushes_local_extras() {
        let server = Arc::new(MemoryAnnotationServer::new());
        let context = context_with(&server);
        let (profile, account) = syncable_account(true);
        let handle = account.book_database_handle().add_book("urn:book:1", BookFormat::Epub);

        let remote = server.store(explicit("urn:book:1", 0.1)).unwrap();
        let local_only = explicit("urn:book:1", 0.9);
        handle.add_bookmark(local_only.clone()).unwrap();

        let received = sync_one_account(&context, &*profile, account.id()).unwrap();

        assert_eq!(received, vec![remote.clone()]);
        assert_eq!(handle.bookmarks().unwrap().len(), 2);
        assert_eq!(server.posted(), vec![local_only]);
    }

    #[test]
    fn test_bookmarks_for_unheld_books_are_skipped() {
        let server = Arc::new(MemoryAnnotationServer::new());
        let context = context_with(&server);
        let (profile, account) = syncable_account(true);
        account.book_database_handle().add_book("urn:book:1", BookFormat::Epub);
        server.store(explicit("urn:book:returned", 0.5)).unwrap();

        let received = sync_one_account(&context, &*profile, account.id()).unwrap();

        assert!(received.is_empty());
    }

    #[test]
    fn test_remote_last_read_fills_slot() {
        let server = Arc::new(MemoryAnnotationServer::new());
        let context = context_with(&server);
        let (profile, account) = syncable_account(true);
        let handle = account.book_database_handle().add_book("urn:book:1", BookFormat::Epub);
        let last_read = server
            .store(explicit("urn:book:1", 0.4).with_kind(BookmarkKind::LastReadLocation))
            .unwrap();

        sync_one_account(&context, &*profile, account.id()).unwrap();

        assert_eq!(handle.last_read_location().unwrap(), Some(last_read));
        assert!(handle.bookmarks().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_failure_still_pushes_local_extras() {
        let server = Arc::new(MemoryAnnotationServer::new().failing(HttpCall::BookmarksGet));
        let context = context_with(&server);
        let events = context.events.subscribe();
        let (profile, account) = syncable_account(true);
        let handle = account.book_database_handle().add_book("urn:book:1", BookFormat::Epub);
        let local_only = explicit("urn:book:1", 0.3);
        handle.add_bookmark(local_only.clone()).unwrap();

        let received = sync_one_account(&context, &*profile, account.id()).unwrap();

        assert!(received.is_empty());
        assert!(server.calls().contains(&HttpCall::BookmarkAdd));
        assert_eq!(server.posted(), vec![local_only]);
        assert_eq!(handle.bookmarks().unwrap().len(), 1);

        let kinds: Vec<_> = events.try_iter().collect();
        assert_eq!(
            kinds,
            vec![
                BookmarkEvent::SyncStarted { account_id: account.id() },
                BookmarkEvent::SyncFinished { account_id: account.id() },
            ]
        );
    }

    #[test]
    fn test_sync_all_isolates_failures() {
        let server = Arc::new(MemoryAnnotationServer::new().failing(HttpCall::BookmarksGet));
        let context = context_with(&server);
        let (profile, _account) = syncable_account(true);
        assert!(sync_all_accounts(&context, &*profile).is_ok());
    }
}
