// crates/sync-engine/src/ops/load.rs
//! Reading bookmarks out of local storage

use crate::accounts::Profile;
use crate::error::SyncResult;
use crate::types::BookmarksForBook;
use crate::worker::WorkerContext;
use pagemark_core::{AccountId, BookId, Bookmark};

/// Loads the bookmarks of a book and records them in the attribute map.
///
/// Never fails: a missing account, book or handle, or a storage error,
/// yields an empty set.
pub(crate) fn load_bookmarks_for_book(
    context: &WorkerContext,
    profile: &dyn Profile,
    account_id: AccountId,
    book_id: &BookId,
) -> BookmarksForBook {
    log::debug!("[{}]: loading bookmarks for book {}", profile.id(), book_id);

    let loaded = match read_bookmarks(profile, account_id, book_id) {
        Ok(Some(loaded)) => {
            log::debug!("[{}]: loaded {} bookmarks", profile.id(), loaded.bookmarks.len());
            loaded
        }
        Ok(None) => {
            log::debug!("[{}]: no format handle; returning empty bookmarks", profile.id());
            BookmarksForBook::empty(book_id.clone())
        }
        Err(e) => {
            log::error!("[{}]: error loading bookmarks: {}", profile.id(), e);
            BookmarksForBook::empty(book_id.clone())
        }
    };

    if let Err(e) = context.attributes.put_book(account_id, loaded.clone()) {
        log::error!("[{}]: unable to publish bookmarks: {}", profile.id(), e);
    }
    loaded
}

fn read_bookmarks(
    profile: &dyn Profile,
    account_id: AccountId,
    book_id: &BookId,
) -> SyncResult<Option<BookmarksForBook>> {
    let account = profile.account(account_id)?;
    let Some(handle) = account.book_database().find_handle(book_id)? else {
        return Ok(None);
    };

    let bookmarks: Vec<Bookmark> = handle
        .bookmarks()?
        .into_iter()
        .filter(Bookmark::is_explicit)
        .collect();
    let last_read = handle.last_read_location()?;
    Ok(Some(BookmarksForBook::new(book_id.clone(), last_read, bookmarks)))
}

/// Loads every book of every account of the profile into the attribute map
pub(crate) fn load_bookmarks_for_all(context: &WorkerContext, profile: &dyn Profile) {
    log::debug!("[{}]: loading bookmarks for profile", profile.id());

    for account in profile.accounts() {
        let books = match account.book_database().books() {
            Ok(books) => books,
            Err(e) => {
                log::error!(
                    "[{}]: error loading bookmarks for account {}: {}",
                    profile.id(),
                    account.id(),
                    e
                );
                continue;
            }
        };
        for book in books {
            load_bookmarks_for_book(context, profile, account.id(), &book);
        }
    }
}
