// crates/wire-format/src/bookmark.rs
//! Versioned bookmark decoding and encoding
//!
//! Four bookmark generations exist in the wild plus the raw positions of the
//! first audiobook players. All of them decode; only the current generation
//! (`20240424`) is ever written, so a decode/encode round trip upgrades
//! historical input.

use crate::error::{WireError, WireResult};
use crate::json::{self, Object};
use crate::legacy_audio;
use crate::locator::LocatorCodec;
use chrono::Utc;
use pagemark_core::{
    format_time, Bookmark, BookmarkFormat, BookmarkKind, Locator, UNKNOWN_DEVICE,
};
use serde_json::{json, Map, Value};

/// Values used when a serialized bookmark predates a field
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackValues {
    pub kind: BookmarkKind,
    pub book_title: String,
    pub book_opds_id: String,
}

impl FallbackValues {
    pub fn new(kind: BookmarkKind, book_title: impl Into<String>, book_opds_id: impl Into<String>) -> Self {
        Self {
            kind,
            book_title: book_title.into(),
            book_opds_id: book_opds_id.into(),
        }
    }
}

/// Bookmark codec
pub struct BookmarkCodec;

impl BookmarkCodec {
    /// Decodes a bookmark of any generation.
    ///
    /// Dispatch is on `@version`; `@type` is informational because older
    /// clients omitted it. An absent or unrecognized version is read with the
    /// legacy layout rather than rejected.
    pub fn decode(value: &Value, fallback: &FallbackValues) -> WireResult<Bookmark> {
        let node = json::as_object(value, "bookmark")?;

        if let Some(type_name) = json::opt_string(node, "@type") {
            if type_name != BookmarkFormat::TYPE_NAME {
                log::debug!("Decoding bookmark with unexpected @type '{}'", type_name);
            }
        }

        let bookmark = match json::opt_string(node, "@version").as_deref() {
            Some("1") => Self::decode_player_position(node, 1, fallback)?,
            Some("2") => Self::decode_player_position(node, 2, fallback)?,
            Some("3") => Self::decode_player_position(node, 3, fallback)?,
            Some("20210317") => Self::decode_top_level(node, BookmarkFormat::V20210317, fallback)?,
            Some("20210828") => Self::decode_top_level(node, BookmarkFormat::V20210828, fallback)?,
            Some("20240424") => Self::decode_current(node, fallback)?,
            Some(other) => {
                log::warn!("Unrecognized bookmark version {}; reading as legacy", other);
                Self::decode_top_level(node, BookmarkFormat::Legacy, fallback)?
            }
            None => Self::decode_top_level(node, BookmarkFormat::Legacy, fallback)?,
        };

        bookmark.check()?;
        Ok(bookmark)
    }

    /// Decodes a bookmark from JSON text
    pub fn decode_str(text: &str, fallback: &FallbackValues) -> WireResult<Bookmark> {
        let value: Value = serde_json::from_str(text)?;
        Self::decode(&value, fallback)
    }

    fn decode_player_position(node: &Object, version: i64, fallback: &FallbackValues) -> WireResult<Bookmark> {
        let location = legacy_audio::decode_player_position(node, version, fallback)?;
        let chapter_title = match &location {
            Locator::AudioBookTimeV1 { title, .. } => title.clone(),
            _ => String::new(),
        };
        Ok(Bookmark {
            format: BookmarkFormat::CURRENT,
            opds_id: fallback.book_opds_id.clone(),
            kind: fallback.kind,
            time: Utc::now(),
            device_id: UNKNOWN_DEVICE.to_string(),
            uri: None,
            location,
            book_progress: 0.0,
            chapter_progress: 0.0,
            chapter_title,
            book_title: fallback.book_title.clone(),
        })
    }

    /// Legacy, `20210317` and `20210828` keep every field at the top level
    /// and name the kind instead of using its motivation URI.
    fn decode_top_level(node: &Object, format: BookmarkFormat, fallback: &FallbackValues) -> WireResult<Bookmark> {
        let kind = match json::opt_string(node, "kind") {
            Some(text) => BookmarkKind::parse(&text)?,
            None => fallback.kind,
        };
        let location = match node.get("location") {
            Some(location) => LocatorCodec::decode(location)?,
            None => return Err(WireError::MissingField("location".to_string())),
        };

        Ok(Bookmark {
            format,
            opds_id: json::string(node, "opdsId")?,
            kind,
            time: json::time(node, "time")?,
            device_id: json::string_or(node, "deviceID", UNKNOWN_DEVICE),
            uri: json::opt_uri(node, "uri")?,
            location,
            book_progress: json::f64_or(node, "bookProgress", 0.0)?,
            chapter_progress: json::f64_or(node, "chapterProgress", 0.0)?,
            chapter_title: json::string_or(node, "chapterTitle", ""),
            book_title: json::string_or(node, "bookTitle", &fallback.book_title),
        })
    }

    fn decode_current(node: &Object, fallback: &FallbackValues) -> WireResult<Bookmark> {
        let metadata = json::object(node, "metadata")?;
        let kind = match json::opt_string(metadata, "kind") {
            Some(uri) => BookmarkKind::parse(&uri)?,
            None => fallback.kind,
        };
        let location = match node.get("location") {
            Some(location) => LocatorCodec::decode(location)?,
            None => return Err(WireError::MissingField("location".to_string())),
        };

        Ok(Bookmark {
            format: BookmarkFormat::V20240424,
            opds_id: json::string(metadata, "opdsId")?,
            kind,
            time: json::time(metadata, "time")?,
            device_id: json::string_or(metadata, "deviceID", UNKNOWN_DEVICE),
            uri: json::opt_uri(metadata, "uri")?,
            location,
            book_progress: json::f64_or(metadata, "bookProgress", 0.0)?,
            chapter_progress: json::f64_or(metadata, "bookChapterProgress", 0.0)?,
            chapter_title: json::string_or(metadata, "bookChapterTitle", ""),
            book_title: json::string_or(metadata, "bookTitle", &fallback.book_title),
        })
    }

    /// Encodes a bookmark in the current format, whatever it was decoded from
    pub fn encode(bookmark: &Bookmark) -> Value {
        let mut metadata = Map::new();
        metadata.insert("bookChapterProgress".to_string(), json!(bookmark.chapter_progress));
        metadata.insert("bookChapterTitle".to_string(), json!(bookmark.chapter_title));
        metadata.insert("bookProgress".to_string(), json!(bookmark.book_progress));
        metadata.insert("bookTitle".to_string(), json!(bookmark.book_title));
        metadata.insert("deviceID".to_string(), json!(bookmark.device_id));
        metadata.insert("kind".to_string(), json!(bookmark.kind.motivation_uri()));
        metadata.insert("opdsId".to_string(), json!(bookmark.opds_id));
        metadata.insert("time".to_string(), json!(format_time(&bookmark.time)));
        if let Some(uri) = &bookmark.uri {
            metadata.insert("uri".to_string(), json!(uri.as_str()));
        }

        json!({
            "@type": BookmarkFormat::TYPE_NAME,
            "@version": BookmarkFormat::CURRENT.type_version(),
            "location": LocatorCodec::encode(&bookmark.location),
            "metadata": Value::Object(metadata),
        })
    }

    /// Encodes a bookmark as compact JSON text
    pub fn encode_string(bookmark: &Bookmark) -> WireResult<String> {
        Ok(serde_json::to_string(&Self::encode(bookmark))?)
    }

    /// Encodes a bookmark as indented JSON text
    pub fn encode_pretty(bookmark: &Bookmark) -> WireResult<String> {
        Ok(serde_json::to_string_pretty(&Self::encode(bookmark))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn explicit_fallback() -> FallbackValues {
        FallbackValues::new(BookmarkKind::Explicit, "Fallback Title", "urn:fallback")
    }

    #[test]
    fn test_legacy_without_version() {
        let text = r#"{"opdsId":"x","time":"2020-01-01T00:00:00Z","location":{"@type":"LocatorPage","page":5}}"#;
        let bookmark = BookmarkCodec::decode_str(text, &explicit_fallback()).unwrap();
        assert_eq!(bookmark.format, BookmarkFormat::Legacy);
        assert_eq!(bookmark.kind, BookmarkKind::Explicit);
        assert_eq!(bookmark.location, Locator::Page { page_number: 5 });
        assert_eq!(bookmark.device_id, "null");
        assert_eq!(bookmark.book_title, "Fallback Title");
    }

    #[test]
    fn test_unrecognized_version_reads_as_legacy() {
        let value = json!({
            "@type": "Bookmark",
            "@version": 20991231,
            "opdsId": "x",
            "time": "2020-01-01T00:00:00Z",
            "location": {"@type": "LocatorPage", "page": 1}
        });
        let bookmark = BookmarkCodec::decode(&value, &explicit_fallback()).unwrap();
        assert_eq!(bookmark.format, BookmarkFormat::Legacy);
    }

    #[test]
    fn test_20210828_kind_name() {
        let value = json!({
            "@type": "Bookmark",
            "@version": 20210828,
            "opdsId": "urn:book",
            "kind": "BookmarkLastReadLocation",
            "time": "2021-08-28T10:00:00.000Z",
            "chapterTitle": "One",
            "bookProgress": 0.1,
            "location": {"@type": "LocatorHrefProgression", "href": "/1.xhtml", "progressWithinChapter": 0.5}
        });
        let bookmark = BookmarkCodec::decode(&value, &explicit_fallback()).unwrap();
        assert_eq!(bookmark.format, BookmarkFormat::V20210828);
        assert_eq!(bookmark.kind, BookmarkKind::LastReadLocation);
        assert_eq!(bookmark.chapter_title, "One");
    }

    #[test]
    fn test_20210317_defaults_kind_from_fallback() {
        let value = json!({
            "@version": "20210317",
            "opdsId": "urn:book",
            "time": "2021-03-17T10:00:00Z",
            "location": {"@type": "BookLocationR2", "href": "/1.xhtml", "progressWithinChapter": 0.5}
        });
        let fallback = FallbackValues::new(BookmarkKind::LastReadLocation, "", "");
        let bookmark = BookmarkCodec::decode(&value, &fallback).unwrap();
        assert_eq!(bookmark.format, BookmarkFormat::V20210317);
        assert_eq!(bookmark.kind, BookmarkKind::LastReadLocation);
    }

    #[test]
    fn test_current_layout() {
        let value = json!({
            "@type": "Bookmark",
            "@version": 20240424,
            "location": {"@type": "LocatorPage", "page": 40},
            "metadata": {
                "opdsId": "urn:pdf",
                "time": "2024-04-24T09:30:00.123Z",
                "deviceID": "urn:uuid:device",
                "uri": "https://example.com/annotations/9",
                "bookChapterTitle": "Intro",
                "bookTitle": "A PDF",
                "bookProgress": 0.4,
                "bookChapterProgress": 0.0,
                "kind": "http://librarysimplified.org/terms/annotation/idling"
            }
        });
        let bookmark = BookmarkCodec::decode(&value, &explicit_fallback()).unwrap();
        assert_eq!(bookmark.format, BookmarkFormat::V20240424);
        assert_eq!(bookmark.kind, BookmarkKind::LastReadLocation);
        assert_eq!(bookmark.book_title, "A PDF");
        assert_eq!(
            bookmark.uri.as_ref().map(|u| u.as_str()),
            Some("https://example.com/annotations/9")
        );
    }

    #[test]
    fn test_current_requires_metadata() {
        let value = json!({"@version": 20240424, "location": {"@type": "LocatorPage", "page": 1}});
        assert!(matches!(
            BookmarkCodec::decode(&value, &explicit_fallback()),
            Err(WireError::MissingField(_))
        ));
    }

    #[test]
    fn test_player_position_uses_fallback_identity() {
        let value = json!({"@version": 2, "location": {"chapter": 4, "part": 0, "time": 1000, "title": "Four"}});
        let fallback = FallbackValues::new(BookmarkKind::LastReadLocation, "Audio", "urn:audio");
        let bookmark = BookmarkCodec::decode(&value, &fallback).unwrap();
        assert_eq!(bookmark.opds_id, "urn:audio");
        assert_eq!(bookmark.format, BookmarkFormat::V20240424);
        assert_eq!(bookmark.chapter_title, "Four");
        assert_eq!(bookmark.kind, BookmarkKind::LastReadLocation);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let bookmark = Bookmark::new(
            "urn:isbn:1",
            Locator::href_progression("/ch1", 0.5).unwrap(),
            BookmarkKind::Explicit,
        )
        .with_time(Utc.with_ymd_and_hms(2024, 4, 24, 8, 0, 0).unwrap())
        .with_book_title("Book")
        .with_book_progress(0.25);

        let first = BookmarkCodec::encode_string(&bookmark).unwrap();
        let decoded = BookmarkCodec::decode_str(&first, &explicit_fallback()).unwrap();
        assert_eq!(decoded, bookmark);
        assert_eq!(decoded.bookmark_id(), bookmark.bookmark_id());
        assert_eq!(BookmarkCodec::encode_string(&decoded).unwrap(), first);
    }

    #[test]
    fn test_encode_upgrades_legacy() {
        let text = r#"{"opdsId":"x","time":"2020-01-01T00:00:00Z","location":{"@type":"LocatorPage","page":5}}"#;
        let legacy = BookmarkCodec::decode_str(text, &explicit_fallback()).unwrap();
        let encoded = BookmarkCodec::encode(&legacy);
        assert_eq!(encoded["@version"], 20240424);
        assert_eq!(encoded["metadata"]["time"], "2020-01-01T00:00:00.000Z");
        let upgraded = BookmarkCodec::decode(&encoded, &explicit_fallback()).unwrap();
        assert_eq!(upgraded.format, BookmarkFormat::V20240424);
        assert_eq!(upgraded, legacy.upgraded());
    }

    #[test]
    fn test_bad_kind_is_an_error() {
        let value = json!({
            "opdsId": "x",
            "kind": "Favourite",
            "time": "2020-01-01T00:00:00Z",
            "location": {"@type": "LocatorPage", "page": 5}
        });
        assert!(BookmarkCodec::decode(&value, &explicit_fallback()).is_err());
    }
}
