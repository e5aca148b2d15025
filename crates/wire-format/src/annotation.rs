// crates/wire-format/src/annotation.rs
//! W3C Web Annotation envelope used by the remote annotation server

use crate::error::{WireError, WireResult};
use crate::locator::LocatorCodec;
use chrono::Utc;
use pagemark_core::{format_time, parse_time, Bookmark, BookmarkFormat, BookmarkKind, UNKNOWN_DEVICE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const ANNOTATION_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";
pub const ANNOTATION_TYPE: &str = "Annotation";
pub const FRAGMENT_SELECTOR: &str = "oa:FragmentSelector";

/// Annotation body; keys are vocabulary URIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBody {
    #[serde(rename = "http://librarysimplified.org/terms/time")]
    pub time: Option<String>,

    #[serde(rename = "http://librarysimplified.org/terms/device", default)]
    pub device: Option<String>,

    #[serde(
        rename = "http://librarysimplified.org/terms/chapter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub chapter_title: Option<String>,

    #[serde(
        rename = "http://librarysimplified.org/terms/progressWithinBook",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub book_progress: Option<f64>,

    #[serde(
        rename = "http://librarysimplified.org/terms/progressWithinChapter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub chapter_progress: Option<f64>,

    #[serde(
        rename = "http://librarysimplified.org/terms/bookTitle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub book_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSelector {
    #[serde(rename = "type")]
    pub selector_type: String,
    /// Locator JSON, as a string
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTarget {
    /// OPDS id of the annotated book
    pub source: String,
    pub selector: AnnotationSelector,
}

/// One bookmark as the annotation server stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkAnnotation {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub motivation: String,
    pub body: AnnotationBody,
    pub target: AnnotationTarget,
}

impl BookmarkAnnotation {
    /// Wraps a bookmark for upload
    pub fn from_bookmark(bookmark: &Bookmark) -> WireResult<Self> {
        let locator = serde_json::to_string(&LocatorCodec::encode(&bookmark.location))?;
        Ok(Self {
            context: Some(ANNOTATION_CONTEXT.to_string()),
            id: bookmark.uri.as_ref().map(|uri| uri.to_string()),
            annotation_type: ANNOTATION_TYPE.to_string(),
            motivation: bookmark.kind.motivation_uri().to_string(),
            body: AnnotationBody {
                time: Some(format_time(&bookmark.time)),
                device: Some(bookmark.device_id.clone()),
                chapter_title: non_empty(&bookmark.chapter_title),
                book_progress: Some(bookmark.book_progress),
                chapter_progress: Some(bookmark.chapter_progress),
                book_title: non_empty(&bookmark.book_title),
            },
            target: AnnotationTarget {
                source: bookmark.opds_id.clone(),
                selector: AnnotationSelector {
                    selector_type: FRAGMENT_SELECTOR.to_string(),
                    value: locator,
                },
            },
        })
    }

    /// Unwraps a downloaded annotation into a current-format bookmark
    pub fn to_bookmark(&self) -> WireResult<Bookmark> {
        match self.target.selector.selector_type.as_str() {
            "FragmentSelector" | FRAGMENT_SELECTOR => {}
            other => return Err(WireError::UnsupportedSelector(other.to_string())),
        }

        let kind = BookmarkKind::of_motivation(&self.motivation)?;
        let location = LocatorCodec::decode_str(&self.target.selector.value)?;
        let time = match &self.body.time {
            Some(text) => parse_time(text)?,
            None => Utc::now(),
        };
        let uri = match &self.id {
            Some(id) => Some(Url::parse(id).map_err(|e| WireError::invalid("id", e.to_string()))?),
            None => None,
        };

        let bookmark = Bookmark {
            format: BookmarkFormat::CURRENT,
            opds_id: self.target.source.clone(),
            kind,
            time,
            device_id: self
                .body
                .device
                .clone()
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            uri,
            // Absent on annotations from older servers
            chapter_progress: self
                .body
                .chapter_progress
                .or_else(|| location.chapter_progress())
                .unwrap_or(0.0),
            location,
            book_progress: self.body.book_progress.unwrap_or(0.0),
            chapter_title: self.body.chapter_title.clone().unwrap_or_default(),
            book_title: self.body.book_title.clone().unwrap_or_default(),
        };
        bookmark.check()?;
        Ok(bookmark)
    }

    /// Serializes to the JSON sent with `application/ld+json`
    pub fn to_json(&self) -> WireResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Result of decoding an annotation list: bookmarks plus per-item failures
#[derive(Debug, Default)]
pub struct AnnotationList {
    pub bookmarks: Vec<Bookmark>,
    pub failures: Vec<WireError>,
}

/// Decodes the body of `GET <annotationsURI>`.
///
/// Accepts both `{ "items": [...] }` and the full annotation collection
/// `{ "first": { "items": [...] } }`. A malformed item is recorded in
/// `failures` and does not affect the others.
pub fn decode_annotation_list(body: &Value) -> WireResult<AnnotationList> {
    let items = body
        .get("first")
        .and_then(|first| first.get("items"))
        .or_else(|| body.get("items"))
        .ok_or_else(|| WireError::MissingField("items".to_string()))?;
    let items = items
        .as_array()
        .ok_or_else(|| WireError::invalid("items", "expected an array"))?;

    let mut list = AnnotationList::default();
    for item in items {
        let decoded = serde_json::from_value::<BookmarkAnnotation>(item.clone())
            .map_err(WireError::from)
            .and_then(|annotation| annotation.to_bookmark());
        match decoded {
            Ok(bookmark) => list.bookmarks.push(bookmark),
            Err(e) => {
                log::debug!("Skipping undecodable annotation: {}", e);
                list.failures.push(e);
            }
        }
    }
    Ok(list)
}

/// Reads the `id` of a freshly created annotation
pub fn decode_created_id(body: &Value) -> WireResult<Url> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| WireError::MissingField("id".to_string()))?;
    Url::parse(id).map_err(|e| WireError::invalid("id", e.to_string()))
}
