// crates/wire-format/src/legacy_audio.rs
//! Raw audiobook player positions
//!
//! Early audiobook players saved their position as a bare object with
//! `@version` 1, 2 or 3 instead of a bookmark. Those positions carry no book
//! identity, so the caller's fallback values supply it.

use crate::bookmark::FallbackValues;
use crate::error::{WireError, WireResult};
use crate::json::{self, Object};
use pagemark_core::Locator;

/// Decodes a player position into an audiobook locator.
///
/// Versions 1 and 2 only recorded an absolute offset, which is used for both
/// the start offset and the time.
pub(crate) fn decode_player_position(
    node: &Object,
    version: i64,
    fallback: &FallbackValues,
) -> WireResult<Locator> {
    let (position, start_offset_ms, time_ms) = match version {
        1 => {
            let position = json::object(node, "position")?;
            let offset = json::i64_required(position, "offsetMilliseconds")?;
            (position, offset, offset)
        }
        2 => {
            let location = json::object(node, "location")?;
            let offset = json::i64_required(location, "time")?;
            (location, offset, offset)
        }
        3 => {
            let location = json::object(node, "location")?;
            let start = json::i64_required(location, "startOffset")?;
            let time = json::i64_required(location, "time")?;
            (location, start, time)
        }
        other => {
            return Err(WireError::invalid(
                "@version",
                format!("Unsupported player position version: {}", other),
            ))
        }
    };

    let locator = Locator::AudioBookTimeV1 {
        audio_book_id: fallback.book_opds_id.clone(),
        part: json::i64_required(position, "part")?,
        chapter: json::i64_required(position, "chapter")?,
        duration_ms: 0,
        start_offset_ms,
        time_ms,
        title: json::string_or(position, "title", ""),
    };
    locator.check()?;
    Ok(locator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::BookmarkKind;
    use serde_json::json;

    fn fallback() -> FallbackValues {
        FallbackValues::new(BookmarkKind::LastReadLocation, "Moby Dick", "urn:moby")
    }

    fn decode(value: serde_json::Value, version: i64) -> WireResult<Locator> {
        let node = value.as_object().cloned().unwrap();
        decode_player_position(&node, version, &fallback())
    }

    #[test]
    fn test_v1_position() {
        let locator = decode(
            json!({"@version": 1, "position": {"chapter": 2, "part": 0, "offsetMilliseconds": 4000, "title": "Two"}}),
            1,
        )
        .unwrap();
        assert_eq!(
            locator,
            Locator::AudioBookTimeV1 {
                audio_book_id: "urn:moby".to_string(),
                part: 0,
                chapter: 2,
                duration_ms: 0,
                start_offset_ms: 4000,
                time_ms: 4000,
                title: "Two".to_string(),
            }
        );
    }

    #[test]
    fn test_v3_keeps_start_offset() {
        let locator = decode(
            json!({"@version": 3, "location": {"chapter": 1, "part": 1, "startOffset": 100, "time": 900}}),
            3,
        )
        .unwrap();
        assert_eq!(locator.time_without_offset(), Some(800));
    }

    #[test]
    fn test_v2_missing_location() {
        assert!(matches!(
            decode(json!({"@version": 2}), 2),
            Err(WireError::MissingField(_))
        ));
    }

    #[test]
    fn test_negative_chapter_rejected() {
        assert!(decode(
            json!({"@version": 2, "location": {"chapter": -1, "part": 0, "time": 1}}),
            2
        )
        .is_err());
    }
}
