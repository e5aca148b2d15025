//! Server annotation listings must never panic the decoder.
//!
//! Run with: cargo fuzz run annotation_list

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Ok(list) = pagemark_wire::decode_annotation_list(&value) {
            for bookmark in &list.bookmarks {
                let _ = bookmark.check();
            }
        }
    }
});
