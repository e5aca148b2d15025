// crates/wire-format/src/locator.rs
//! Locator decoding and encoding

use crate::error::{WireError, WireResult};
use crate::json::{self, Object};
use pagemark_core::Locator;
use serde_json::{json, Value};

/// Locator codec
pub struct LocatorCodec;

impl LocatorCodec {
    /// Decodes a locator, dispatching on `@type`.
    ///
    /// `BookLocationR1` and `BookLocationR2` are older names of the CFI and
    /// href/progression locators. Unknown or missing types are read as CFI.
    pub fn decode(value: &Value) -> WireResult<Locator> {
        let node = json::as_object(value, "location")?;
        let locator = match json::opt_string(node, "@type").as_deref() {
            Some("BookLocationR1") | Some("LocatorLegacyCFI") => Self::decode_legacy_cfi(node)?,
            Some("BookLocationR2") | Some("LocatorHrefProgression") => {
                Self::decode_href_progression(node)?
            }
            Some("LocatorPage") => Self::decode_page(node)?,
            Some("LocatorAudioBookTime") => Self::decode_audio_book_time(node)?,
            _ => Self::decode_legacy_cfi(node)?,
        };
        locator.check()?;
        Ok(locator)
    }

    /// Decodes a locator from JSON text, as found in annotation selectors
    pub fn decode_str(text: &str) -> WireResult<Locator> {
        let value: Value = serde_json::from_str(text)?;
        Self::decode(&value)
    }

    fn decode_legacy_cfi(node: &Object) -> WireResult<Locator> {
        Ok(Locator::LegacyCfi {
            id_ref: json::opt_string(node, "idref"),
            content_cfi: json::opt_string(node, "contentCFI"),
            chapter_progression: json::f64_or(node, "progressWithinChapter", 0.0)?,
        })
    }

    fn decode_href_progression(node: &Object) -> WireResult<Locator> {
        Ok(Locator::HrefProgression {
            href: json::string(node, "href")?,
            chapter_progress: json::f64_required(node, "progressWithinChapter")?,
        })
    }

    fn decode_page(node: &Object) -> WireResult<Locator> {
        Ok(Locator::Page {
            page_number: json::i64_required(node, "page")?,
        })
    }

    fn decode_audio_book_time(node: &Object) -> WireResult<Locator> {
        match json::i64_or(node, "@version", 1)? {
            1 => Ok(Locator::AudioBookTimeV1 {
                audio_book_id: json::string(node, "audiobookID")?,
                part: json::i64_required(node, "part")?,
                chapter: json::i64_required(node, "chapter")?,
                duration_ms: json::i64_required(node, "duration")?,
                start_offset_ms: json::i64_or(node, "startOffset", 0)?,
                time_ms: json::i64_required(node, "time")?,
                title: json::string(node, "title")?,
            }),
            2 => Ok(Locator::AudioBookTimeV2 {
                reading_order_item_href: match json::opt_string(node, "readingOrderItem") {
                    Some(href) => href,
                    None => json::string(node, "chapterHref")?,
                },
                offset_ms: match json::opt_i64(node, "readingOrderItemOffsetMilliseconds")? {
                    Some(offset) => offset,
                    None => json::i64_required(node, "chapterOffsetMilliseconds")?,
                },
            }),
            other => Err(WireError::UnsupportedLocatorVersion(other)),
        }
    }

    /// Encodes a locator using the current type names
    pub fn encode(locator: &Locator) -> Value {
        match locator {
            Locator::LegacyCfi {
                id_ref,
                content_cfi,
                chapter_progression,
            } => {
                let mut node = json!({
                    "@type": locator.type_name(),
                    "progressWithinChapter": chapter_progression,
                });
                if let Some(id_ref) = id_ref {
                    node["idref"] = json!(id_ref);
                }
                if let Some(cfi) = content_cfi {
                    node["contentCFI"] = json!(cfi);
                }
                node
            }
            Locator::HrefProgression {
                href,
                chapter_progress,
            } => json!({
                "@type": locator.type_name(),
                "href": href,
                "progressWithinChapter": chapter_progress,
            }),
            Locator::Page { page_number } => json!({
                "@type": locator.type_name(),
                "page": page_number,
            }),
            Locator::AudioBookTimeV1 {
                audio_book_id,
                part,
                chapter,
                duration_ms,
                start_offset_ms,
                time_ms,
                title,
            } => json!({
                "@type": locator.type_name(),
                "@version": 1,
                "audiobookID": audio_book_id,
                "chapter": chapter,
                "duration": duration_ms,
                "part": part,
                "startOffset": start_offset_ms,
                "time": time_ms,
                "title": title,
            }),
            Locator::AudioBookTimeV2 {
                reading_order_item_href,
                offset_ms,
            } => json!({
                "@type": locator.type_name(),
                "@version": 2,
                "readingOrderItem": reading_order_item_href,
                "readingOrderItemOffsetMilliseconds": offset_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r2_synonym() {
        let value = json!({"@type": "BookLocationR2", "href": "/ch1.xhtml", "progressWithinChapter": 0.25});
        assert_eq!(
            LocatorCodec::decode(&value).unwrap(),
            Locator::HrefProgression {
                href: "/ch1.xhtml".to_string(),
                chapter_progress: 0.25
            }
        );
    }

    #[test]
    fn test_r1_synonym_and_cfi_defaults() {
        let value = json!({"@type": "BookLocationR1", "idref": "c1"});
        assert_eq!(
            LocatorCodec::decode(&value).unwrap(),
            Locator::LegacyCfi {
                id_ref: Some("c1".to_string()),
                content_cfi: None,
                chapter_progression: 0.0
            }
        );
    }

    #[test]
    fn test_unknown_type_falls_back_to_cfi() {
        let value = json!({"@type": "SomethingNew", "contentCFI": "/4/2", "progressWithinChapter": 0.5});
        assert!(matches!(
            LocatorCodec::decode(&value).unwrap(),
            Locator::LegacyCfi { .. }
        ));
        let untyped = json!({"contentCFI": "/4/2"});
        assert!(matches!(
            LocatorCodec::decode(&untyped).unwrap(),
            Locator::LegacyCfi { .. }
        ));
    }

    #[test]
    fn test_href_progression_requires_progress() {
        let value = json!({"@type": "LocatorHrefProgression", "href": "/ch1"});
        assert!(matches!(
            LocatorCodec::decode(&value),
            Err(WireError::MissingField(_))
        ));
    }

    #[test]
    fn test_progress_range_enforced() {
        let value = json!({"@type": "LocatorHrefProgression", "href": "/ch1", "progressWithinChapter": 3.0});
        assert!(matches!(LocatorCodec::decode(&value), Err(WireError::Domain(_))));
    }

    #[test]
    fn test_negative_page_rejected() {
        let value = json!({"@type": "LocatorPage", "page": -2});
        assert!(LocatorCodec::decode(&value).is_err());
    }

    #[test]
    fn test_audio_book_time_v1_default_version() {
        let value = json!({
            "@type": "LocatorAudioBookTime",
            "audiobookID": "urn:ab",
            "part": 1,
            "chapter": 3,
            "duration": 60000,
            "time": 1500,
            "title": "Chapter 3"
        });
        match LocatorCodec::decode(&value).unwrap() {
            Locator::AudioBookTimeV1 {
                start_offset_ms,
                chapter,
                ..
            } => {
                assert_eq!(start_offset_ms, 0);
                assert_eq!(chapter, 3);
            }
            other => panic!("unexpected locator {:?}", other),
        }
    }

    #[test]
    fn test_audio_book_time_v2_both_spellings() {
        let current = json!({
            "@type": "LocatorAudioBookTime",
            "@version": 2,
            "readingOrderItem": "urn:track:1",
            "readingOrderItemOffsetMilliseconds": 900
        });
        let older = json!({
            "@type": "LocatorAudioBookTime",
            "@version": 2,
            "chapterHref": "urn:track:1",
            "chapterOffsetMilliseconds": 900
        });
        assert_eq!(
            LocatorCodec::decode(&current).unwrap(),
            LocatorCodec::decode(&older).unwrap()
        );
    }

    #[test]
    fn test_audio_book_time_unknown_version() {
        let value = json!({"@type": "LocatorAudioBookTime", "@version": 7});
        assert!(matches!(
            LocatorCodec::decode(&value),
            Err(WireError::UnsupportedLocatorVersion(7))
        ));
    }

    #[test]
    fn test_encode_then_decode_page() {
        let locator = Locator::page(12).unwrap();
        let encoded = LocatorCodec::encode(&locator);
        assert_eq!(encoded["@type"], "LocatorPage");
        assert_eq!(LocatorCodec::decode(&encoded).unwrap(), locator);
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(
            LocatorCodec::decode(&json!("text")),
            Err(WireError::NotAnObject(_))
        ));
    }
}
