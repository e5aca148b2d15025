// crates/sync-engine/src/attributes.rs
//! Snapshot of every known bookmark, readable without waiting on the worker

use crate::error::{SyncError, SyncResult};
use crate::types::BookmarksForBook;
use pagemark_core::{AccountId, BookId, Bookmark, BookmarkKind};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Bookmarks per book, per account
pub type BookmarkMap = HashMap<AccountId, HashMap<BookId, BookmarksForBook>>;

/// Shared bookmark map.
///
/// Only the worker writes; any thread may read.
#[derive(Clone, Default)]
pub struct BookmarkAttributes {
    inner: Arc<RwLock<BookmarkMap>>,
}

impl BookmarkAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole map
    pub fn snapshot(&self) -> SyncResult<BookmarkMap> {
        self.inner
            .read()
            .map(|map| map.clone())
            .map_err(|_| SyncError::lock_poisoned())
    }

    /// Bookmarks of one book, if known
    pub fn for_book(&self, account_id: AccountId, book_id: &BookId) -> SyncResult<Option<BookmarksForBook>> {
        let map = self.inner.read().map_err(|_| SyncError::lock_poisoned())?;
        Ok(map
            .get(&account_id)
            .and_then(|books| books.get(book_id))
            .cloned())
    }

    /// Records a bookmark.
    ///
    /// Last-read bookmarks replace the slot; explicit bookmarks replace any
    /// interchangeable entry.
    pub fn add_bookmark(&self, account_id: AccountId, bookmark: &Bookmark) -> SyncResult<()> {
        let mut map = self.inner.write().map_err(|_| SyncError::lock_poisoned())?;
        let book_id = bookmark.book_id();
        let for_book = map
            .entry(account_id)
            .or_default()
            .entry(book_id.clone())
            .or_insert_with(|| BookmarksForBook::empty(book_id));

        match bookmark.kind {
            BookmarkKind::LastReadLocation => {
                for_book.last_read = Some(bookmark.clone());
            }
            BookmarkKind::Explicit => {
                for_book
                    .bookmarks
                    .retain(|existing| !existing.is_interchangeable_with(bookmark));
                for_book.bookmarks.push(bookmark.clone());
            }
        }
        Ok(())
    }

    /// Forgets an explicit bookmark; last-read slots are left alone
    pub fn remove_bookmark(&self, account_id: AccountId, bookmark: &Bookmark) -> SyncResult<()> {
        if bookmark.kind != BookmarkKind::Explicit {
            return Ok(());
        }
        let mut map = self.inner.write().map_err(|_| SyncError::lock_poisoned())?;
        if let Some(for_book) = map
            .get_mut(&account_id)
            .and_then(|books| books.get_mut(&bookmark.book_id()))
        {
            let id = bookmark.bookmark_id();
            for_book.bookmarks.retain(|existing| existing.bookmark_id() != id);
        }
        Ok(())
    }

    /// Replaces everything known about one book
    pub fn put_book(&self, account_id: AccountId, bookmarks: BookmarksForBook) -> SyncResult<()> {
        let mut map = self.inner.write().map_err(|_| SyncError::lock_poisoned())?;
        map.entry(account_id)
            .or_default()
            .insert(bookmarks.book_id.clone(), bookmarks);
        Ok(())
    }

    /// Forgets everything about an account
    pub fn remove_account(&self, account_id: AccountId) -> SyncResult<()> {
        let mut map = self.inner.write().map_err(|_| SyncError::lock_poisoned())?;
        map.remove(&account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::Locator;
    use url::Url;

    fn explicit(page: i64) -> Bookmark {
        Bookmark::new("urn:book:1", Locator::page(page).unwrap(), BookmarkKind::Explicit)
    }

    #[test]
    fn test_interchangeable_bookmarks_are_replaced() {
        let attributes = BookmarkAttributes::new();
        let account_id = AccountId::new();
        let local = explicit(4);
        let remote = local.with_uri(Url::parse("https://example.com/a/9").unwrap());

        attributes.add_bookmark(account_id, &local).unwrap();
        attributes.add_bookmark(account_id, &remote).unwrap();
        attributes.add_bookmark(account_id, &explicit(5)).unwrap();

        let for_book = attributes
            .for_book(account_id, &local.book_id())
            .unwrap()
            .unwrap();
        assert_eq!(for_book.bookmarks.len(), 2);
        assert!(for_book.bookmarks.contains(&remote));
    }

    #[test]
    fn test_last_read_fills_slot() {
        let attributes = BookmarkAttributes::new();
        let account_id = AccountId::new();
        let first = explicit(1).with_kind(BookmarkKind::LastReadLocation);
        let second = explicit(2).with_kind(BookmarkKind::LastReadLocation);

        attributes.add_bookmark(account_id, &first).unwrap();
        attributes.add_bookmark(account_id, &second).unwrap();

        let for_book = attributes
            .for_book(account_id, &first.book_id())
            .unwrap()
            .unwrap();
        assert_eq!(for_book.last_read, Some(second));
        assert!(for_book.bookmarks.is_empty());
    }

    #[test]
    fn test_remove_bookmark_and_account() {
        let attributes = BookmarkAttributes::new();
        let account_id = AccountId::new();
        let bookmark = explicit(7);
        attributes.add_bookmark(account_id, &bookmark).unwrap();

        attributes.remove_bookmark(account_id, &bookmark).unwrap();
        let for_book = attributes
            .for_book(account_id, &bookmark.book_id())
            .unwrap()
            .unwrap();
        assert!(for_book.bookmarks.is_empty());

        attributes.remove_account(account_id).unwrap();
        assert!(attributes.snapshot().unwrap().is_empty());
    }
}
