//! Stored bookmark text of any shape must decode or fail, never panic.
//! Anything that decodes must survive a re-encode.
//!
//! Run with: cargo fuzz run bookmark_decode

#![no_main]
use libfuzzer_sys::fuzz_target;
use pagemark_core::BookmarkKind;
use pagemark_wire::{BookmarkCodec, FallbackValues};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let fallback = FallbackValues::new(BookmarkKind::Explicit, "Fuzzed", "urn:isbn:0");
        if let Ok(bookmark) = BookmarkCodec::decode_str(text, &fallback) {
            let _ = BookmarkCodec::encode(&bookmark);
        }
    }
});
