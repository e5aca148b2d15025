// crates/wire-format/src/lib.rs
//! Bookmark wire formats
//!
//! This crate reads and writes bookmarks as exchanged between devices:
//! - Every historical bookmark generation (legacy, 20210317, 20210828)
//! - The current generation (20240424), the only one ever written
//! - Raw positions saved by the first audiobook players
//! - The W3C annotation envelope used by the annotation server
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{BookmarkKind, Locator};
//! use pagemark_wire::{BookmarkCodec, FallbackValues};
//!
//! let legacy = r#"{"opdsId":"x","time":"2020-01-01T00:00:00Z",
//!                  "location":{"@type":"LocatorPage","page":5}}"#;
//! let fallback = FallbackValues::new(BookmarkKind::Explicit, "", "x");
//!
//! let bookmark = BookmarkCodec::decode_str(legacy, &fallback).expect("Failed to decode bookmark");
//! assert_eq!(bookmark.location, Locator::Page { page_number: 5 });
//!
//! // Re-encoding always produces the current format.
//! let upgraded = BookmarkCodec::encode(&bookmark);
//! assert_eq!(upgraded["@version"], 20240424);
//! ```

mod annotation;
mod bookmark;
mod error;
mod json;
mod legacy_audio;
mod locator;

pub use annotation::{
    decode_annotation_list, decode_created_id, AnnotationBody, AnnotationList,
    AnnotationSelector, AnnotationTarget, BookmarkAnnotation, ANNOTATION_CONTEXT,
};
pub use bookmark::{BookmarkCodec, FallbackValues};
pub use error::{WireError, WireResult};
pub use locator::LocatorCodec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _: FallbackValues =
            FallbackValues::new(pagemark_core::BookmarkKind::Explicit, "", "");
        let _: AnnotationList = AnnotationList::default();
        let _: WireError = WireError::MissingField("x".to_string());
    }
}
