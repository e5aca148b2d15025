// crates/network/src/lib.rs
//! Client for the library annotation server
//!
//! Bookmarks are stored remotely as W3C annotations under each account's
//! annotations URI, and the patron's sync permission lives in the patron
//! settings document. [`BookmarkHttpCalls`] is the seam the sync engine
//! depends on; [`HttpBookmarkCalls`] implements it with a blocking
//! `reqwest` client.

mod calls;
mod client;
mod error;
mod problem;

pub use calls::{
    parse_sync_setting, sync_setting_document, BookmarkHttpCalls, HttpBookmarkCalls,
    ANNOTATION_CONTENT_TYPE, PROFILE_CONTENT_TYPE, SYNC_SETTING_KEY,
};
pub use client::{Client, ClientConfig, TokenRefreshHandler};
pub use error::{NetworkError, NetworkResult};
pub use problem::ProblemReport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let client = Client::new().expect("Failed to create client");
        let calls: HttpBookmarkCalls = HttpBookmarkCalls::new(client);
        let _: &dyn BookmarkHttpCalls = &calls;
        let _: ProblemReport = ProblemReport::default();
    }
}
