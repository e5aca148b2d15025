// crates/sync-engine/src/storage.rs
//! Contracts for local per-book bookmark storage

use crate::error::SyncResult;
use crate::normalize::normalize;
use pagemark_core::{BookFormat, BookId, Bookmark, BookmarkId};
use std::sync::Arc;

/// Bookmark storage of one book in one format.
///
/// Last-read is a single slot, never a member of the explicit set, because
/// its identity changes with every position update.
pub trait FormatHandle: Send + Sync {
    /// Format this handle stores
    fn format(&self) -> BookFormat;

    /// Stored explicit bookmarks
    fn bookmarks(&self) -> SyncResult<Vec<Bookmark>>;

    /// Stored last-read location
    fn last_read_location(&self) -> SyncResult<Option<Bookmark>>;

    /// Replaces the stored explicit bookmarks
    fn set_bookmarks(&self, bookmarks: Vec<Bookmark>) -> SyncResult<()>;

    /// Replaces or clears the last-read slot
    fn set_last_read_location(&self, bookmark: Option<Bookmark>) -> SyncResult<()>;

    /// Merges a bookmark into the explicit set by identity
    fn add_bookmark(&self, bookmark: Bookmark) -> SyncResult<()> {
        let existing = self.bookmarks()?;
        self.set_bookmarks(normalize(&existing, bookmark))
    }

    /// Removes the explicit bookmark with the given ID, if stored
    fn delete_bookmark(&self, id: &BookmarkId) -> SyncResult<()> {
        let existing = self.bookmarks()?;
        let remaining: Vec<Bookmark> = existing
            .into_iter()
            .filter(|bookmark| &bookmark.bookmark_id() != id)
            .collect();
        self.set_bookmarks(remaining)
    }
}

/// The books an account holds locally
pub trait BookDatabase: Send + Sync {
    /// IDs of every held book
    fn books(&self) -> SyncResult<Vec<BookId>>;

    /// Storage handle of a book in one format, if the book has that format
    fn format_handle(&self, book: &BookId, format: BookFormat)
        -> SyncResult<Option<Arc<dyn FormatHandle>>>;

    /// True if the book is held
    fn contains(&self, book: &BookId) -> SyncResult<bool> {
        Ok(self.books()?.contains(book))
    }

    /// Every storage handle of a book, in lookup order
    fn format_handles(&self, book: &BookId) -> SyncResult<Vec<Arc<dyn FormatHandle>>> {
        let mut handles = Vec::new();
        for format in BookFormat::LOOKUP_ORDER {
            if let Some(handle) = self.format_handle(book, format)? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    /// The book's active handle: EPUB, then audiobook, then PDF
    fn find_handle(&self, book: &BookId) -> SyncResult<Option<Arc<dyn FormatHandle>>> {
        for format in BookFormat::LOOKUP_ORDER {
            if let Some(handle) = self.format_handle(book, format)? {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBookDatabase;
    use pagemark_core::{BookmarkKind, Locator};

    fn explicit(page: i64) -> Bookmark {
        Bookmark::new("urn:book:1", Locator::page(page).unwrap(), BookmarkKind::Explicit)
    }

    #[test]
    fn test_add_bookmark_deduplicates() {
        let database = MemoryBookDatabase::new();
        let handle = database.add_book("urn:book:1", BookFormat::Epub);

        handle.add_bookmark(explicit(1)).unwrap();
        handle.add_bookmark(explicit(1)).unwrap();
        handle.add_bookmark(explicit(2)).unwrap();

        assert_eq!(handle.bookmarks().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_bookmark_by_id() {
        let database = MemoryBookDatabase::new();
        let handle = database.add_book("urn:book:1", BookFormat::Epub);
        handle.add_bookmark(explicit(1)).unwrap();
        handle.add_bookmark(explicit(2)).unwrap();

        handle.delete_bookmark(&explicit(1).bookmark_id()).unwrap();

        let remaining = handle.bookmarks().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].bookmark_id(), explicit(2).bookmark_id());
    }

    #[test]
    fn test_find_handle_lookup_order() {
        let database = MemoryBookDatabase::new();
        database.add_book("urn:book:1", BookFormat::Pdf);
        database.add_book("urn:book:1", BookFormat::AudioBook);

        let book = BookId::from_opds_id("urn:book:1");
        let handle = database.find_handle(&book).unwrap().unwrap();
        assert_eq!(handle.format(), BookFormat::AudioBook);
        assert_eq!(database.format_handles(&book).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_book_has_no_handle() {
        let database = MemoryBookDatabase::new();
        let book = BookId::from_opds_id("urn:book:missing");
        assert!(database.find_handle(&book).unwrap().is_none());
        assert!(!database.contains(&book).unwrap());
    }
}
