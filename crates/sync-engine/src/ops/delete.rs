// crates/sync-engine/src/ops/delete.rs
//! Deleting bookmarks remotely and locally

use crate::accounts::{Profile, SyncableAccount};
use crate::error::SyncResult;
use crate::worker::WorkerContext;
use pagemark_core::{AccountId, Bookmark, BookmarkKind};

/// Deletes a bookmark on the server, then locally.
///
/// Bookmarks without a URI and accounts that cannot sync have nothing to
/// delete remotely. A failed remote delete skips the local delete unless
/// `ignore_remote_failures` is set.
pub(crate) fn delete_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: &Bookmark,
    ignore_remote_failures: bool,
) -> SyncResult<()> {
    if let Err(e) = delete_remote_bookmark(context, profile, account_id, bookmark) {
        if !ignore_remote_failures {
            log::error!("[{}]: error deleting bookmark: {}", profile.id(), e);
            return Err(e);
        }
        log::warn!(
            "[{}]: deleting bookmark locally after remote failure: {}",
            profile.id(),
            e
        );
    }
    delete_local_bookmark(context, profile, account_id, bookmark)
}

fn delete_remote_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: &Bookmark,
) -> SyncResult<()> {
    log::debug!(
        "[{}]: remote deleting bookmark {}",
        profile.id(),
        bookmark.bookmark_id()
    );

    let Some(uri) = &bookmark.uri else {
        log::debug!(
            "[{}]: cannot remotely delete bookmark {}; it has no URI",
            profile.id(),
            bookmark.bookmark_id()
        );
        return Ok(());
    };

    let account = profile.account(account_id)?;
    let Some(syncable) = SyncableAccount::of_account(&account) else {
        log::debug!(
            "[{}]: cannot remotely delete bookmark {}; the account is not syncable",
            profile.id(),
            bookmark.bookmark_id()
        );
        return Ok(());
    };

    context.http.bookmark_delete(uri, &syncable.credentials)?;
    Ok(())
}

fn delete_local_bookmark(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    bookmark: &Bookmark,
) -> SyncResult<()> {
    log::debug!(
        "[{}]: locally deleting bookmark {}",
        profile.id(),
        bookmark.bookmark_id()
    );

    let account = profile.account(account_id)?;
    match account.book_database().find_handle(&bookmark.book_id())? {
        Some(handle) => match bookmark.kind {
            BookmarkKind::LastReadLocation => handle.set_last_read_location(None)?,
            BookmarkKind::Explicit => handle.delete_bookmark(&bookmark.bookmark_id())?,
        },
        None => {
            log::debug!("[{}]: unable to delete bookmark; no format handle", profile.id());
        }
    }

    context.attributes.remove_bookmark(account_id, bookmark)?;
    Ok(())
}
