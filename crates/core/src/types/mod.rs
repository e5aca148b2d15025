//! Domain types for Pagemark
//!
//! - `book`: book identity and storage formats
//! - `account`: accounts, profiles, credentials and preferences
//! - `locator`: positions inside a book
//! - `bookmark`: bookmarks and their content-derived identity
//! - `common`: timestamps, hashing and validation helpers

mod account;
mod book;
mod bookmark;
mod common;
mod locator;

pub use account::{AccountCredentials, AccountId, AccountPreferences, AuthScheme, ProfileId};
pub use book::{BookFormat, BookId};
pub use bookmark::{
    Bookmark, BookmarkFormat, BookmarkId, BookmarkKind, MOTIVATION_BOOKMARKING,
    MOTIVATION_BOOKMARKING_OBSOLETE, MOTIVATION_IDLING, UNKNOWN_DEVICE,
};
pub use common::{format_time, parse_time, sha256_hex, IdentityDigest, Validator};
pub use locator::Locator;
