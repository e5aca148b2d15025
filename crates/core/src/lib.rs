//! Core domain model for Pagemark
//!
//! Bookmarks, locators, accounts and the content-derived bookmark identity
//! shared by the wire codec, the network client and the sync engine.

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    format_time, parse_time, AccountCredentials, AccountId, AccountPreferences, AuthScheme,
    BookFormat, BookId, Bookmark, BookmarkFormat, BookmarkId, BookmarkKind, Locator, ProfileId,
    Validator, MOTIVATION_BOOKMARKING, MOTIVATION_IDLING, UNKNOWN_DEVICE,
};
