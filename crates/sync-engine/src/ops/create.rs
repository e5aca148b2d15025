// crates/sync-engine/src/ops/create.rs
//! Creating bookmarks locally and on the server

use crate::accounts::{Profile, SyncableAccount};
use crate::error::{SyncError, SyncResult};
use crate::types::BookmarkEvent;
use crate::worker::WorkerContext;
use pagemark_core::{AccountId, Bookmark, BookmarkKind};

/// Saves a bookmark into the book's active format handle
pub(crate) fn create_local_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: Bookmark,
) -> SyncResult<Bookmark> {
    log::debug!(
        "[{}]: locally saving bookmark {}",
        profile.id(),
        bookmark.bookmark_id()
    );

    let book_id = bookmark.book_id();
    let account = profile.account(account_id)?;
    let handle = account
        .book_database()
        .find_handle(&book_id)?
        .ok_or_else(|| {
            log::debug!("[{}]: unable to save bookmark; no format handle", profile.id());
            SyncError::NoFormatHandle(book_id)
        })?;

    match bookmark.kind {
        BookmarkKind::LastReadLocation => handle.set_last_read_location(Some(bookmark.clone()))?,
        BookmarkKind::Explicit => handle.add_bookmark(bookmark.clone())?,
    }

    context.attributes.add_bookmark(account_id, &bookmark)?;
    context.events.publish(BookmarkEvent::Saved {
        account_id,
        bookmark: bookmark.clone(),
    });
    Ok(bookmark)
}

/// Uploads a bookmark and returns it carrying its server URI.
///
/// Accounts that cannot sync get the bookmark back unchanged.
pub(crate) fn create_remote_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: Bookmark,
) -> SyncResult<Bookmark> {
    log::debug!(
        "[{}]: remote sending bookmark {}",
        profile.id(),
        bookmark.bookmark_id()
    );

    let account = profile.account(account_id)?;
    let Some(syncable) = SyncableAccount::of_account(&account) else {
        log::debug!(
            "[{}]: cannot remotely send bookmark {}; the account is not syncable",
            profile.id(),
            bookmark.bookmark_id()
        );
        return Ok(bookmark);
    };

    let uri = context
        .http
        .bookmark_add(&syncable.annotations_uri, &syncable.credentials, &bookmark)?;
    Ok(bookmark.with_uri(uri))
}

/// Uploads, then saves locally.
///
/// When the upload fails the original is saved anyway if
/// `ignore_remote_failures` is set; otherwise nothing is saved.
pub(crate) fn create_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: Bookmark,
    ignore_remote_failures: bool,
) -> SyncResult<Bookmark> {
    match create_remote_bookmark(context, profile, account_id, bookmark.clone()) {
        Ok(remote) => create_local_bookmark(context, profile, account_id, remote),
        Err(e) if ignore_remote_failures => {
            log::warn!(
                "[{}]: saving bookmark locally after remote failure: {}",
                profile.id(),
                e
            );
            create_local_bookmark(context, profile, account_id, bookmark)
        }
        Err(e) => {
            log::error!("[{}]: error sending bookmark: {}", profile.id(), e);
            Err(e)
        }
    }
}
