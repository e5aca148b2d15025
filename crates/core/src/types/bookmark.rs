//! Bookmark domain model
//!
//! A [`Bookmark`] is an immutable value. Its identity is a SHA-256 digest over
//! fields chosen by the wire-format generation the bookmark was read from, so
//! the same bookmark computed on two devices always gets the same
//! [`BookmarkId`].

use crate::error::{CoreError, CoreResult};
use crate::types::common::{format_time, IdentityDigest, Validator};
use crate::types::{BookId, Locator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Motivation of last-read bookmarks in the annotation vocabulary
pub const MOTIVATION_IDLING: &str = "http://librarysimplified.org/terms/annotation/idling";
/// Motivation of explicit bookmarks
pub const MOTIVATION_BOOKMARKING: &str = "http://www.w3.org/ns/oa#bookmarking";
/// Older servers wrote the bookmarking motivation with https
pub const MOTIVATION_BOOKMARKING_OBSOLETE: &str = "https://www.w3.org/ns/oa#bookmarking";

/// Device id recorded when none is known
pub const UNKNOWN_DEVICE: &str = "null";

/// The kind of a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookmarkKind {
    /// Created explicitly by the reader
    Explicit,
    /// The reader's most recent position; at most one per book
    LastReadLocation,
}

impl BookmarkKind {
    /// Motivation URI used on the wire
    pub fn motivation_uri(&self) -> &'static str {
        match self {
            Self::Explicit => MOTIVATION_BOOKMARKING,
            Self::LastReadLocation => MOTIVATION_IDLING,
        }
    }

    /// Name used by the older wire formats
    pub fn name(&self) -> &'static str {
        match self {
            Self::Explicit => "BookmarkExplicit",
            Self::LastReadLocation => "BookmarkLastReadLocation",
        }
    }

    /// Parses a motivation URI, accepting the obsolete https bookmarking URI
    pub fn of_motivation(uri: &str) -> CoreResult<Self> {
        match uri {
            MOTIVATION_IDLING => Ok(Self::LastReadLocation),
            MOTIVATION_BOOKMARKING | MOTIVATION_BOOKMARKING_OBSOLETE => Ok(Self::Explicit),
            other => Err(CoreError::UnrecognizedKind(other.to_string())),
        }
    }

    /// Parses either a kind name or a motivation URI
    pub fn parse(text: &str) -> CoreResult<Self> {
        match text {
            "BookmarkExplicit" => Ok(Self::Explicit),
            "BookmarkLastReadLocation" => Ok(Self::LastReadLocation),
            other => Self::of_motivation(other),
        }
    }
}

impl fmt::Display for BookmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Content-derived bookmark identifier (64 lowercase hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkId(String);

impl BookmarkId {
    /// Wraps an existing identifier
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the BookmarkId as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire-format generation a bookmark was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookmarkFormat {
    /// Unversioned bookmarks written before 2021
    Legacy,
    V20210317,
    V20210828,
    /// The only generation ever written
    V20240424,
}

impl BookmarkFormat {
    /// The generation produced by the encoder
    pub const CURRENT: BookmarkFormat = BookmarkFormat::V20240424;

    /// `@type` of every generation
    pub const TYPE_NAME: &'static str = "Bookmark";

    /// Numeric `@version`
    pub fn type_version(&self) -> i64 {
        match self {
            Self::Legacy => 20210316,
            Self::V20210317 => 20210317,
            Self::V20210828 => 20210828,
            Self::V20240424 => 20240424,
        }
    }

    /// Maps a numeric `@version` to a known generation
    pub fn from_version(version: i64) -> Option<Self> {
        match version {
            20210316 => Some(Self::Legacy),
            20210317 => Some(Self::V20210317),
            20210828 => Some(Self::V20210828),
            20240424 => Some(Self::V20240424),
            _ => None,
        }
    }
}

impl fmt::Display for BookmarkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            other => write!(f, "{}", other.type_version()),
        }
    }
}

/// A reading position or explicit bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub format: BookmarkFormat,
    /// Identifier of the book in the OPDS feed that provided it
    pub opds_id: String,
    pub kind: BookmarkKind,
    pub time: DateTime<Utc>,
    pub device_id: String,
    /// Server-assigned URI once the bookmark exists remotely
    pub uri: Option<Url>,
    pub location: Locator,
    pub book_progress: f64,
    pub chapter_progress: f64,
    pub chapter_title: String,
    pub book_title: String,
}

impl Bookmark {
    /// Creates a current-format bookmark stamped with the present time
    pub fn new(opds_id: impl Into<String>, location: Locator, kind: BookmarkKind) -> Self {
        let chapter_progress = location.chapter_progress().unwrap_or(0.0);
        Self {
            format: BookmarkFormat::CURRENT,
            opds_id: opds_id.into(),
            kind,
            time: Utc::now(),
            device_id: UNKNOWN_DEVICE.to_string(),
            uri: None,
            location,
            book_progress: 0.0,
            chapter_progress,
            chapter_title: String::new(),
            book_title: String::new(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_book_title(mut self, title: impl Into<String>) -> Self {
        self.book_title = title.into();
        self
    }

    pub fn with_chapter_title(mut self, title: impl Into<String>) -> Self {
        self.chapter_title = title.into();
        self
    }

    pub fn with_book_progress(mut self, progress: f64) -> Self {
        self.book_progress = progress;
        self
    }

    pub fn with_chapter_progress(mut self, progress: f64) -> Self {
        self.chapter_progress = progress;
        self
    }

    pub fn with_format(mut self, format: BookmarkFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_kind(mut self, kind: BookmarkKind) -> Self {
        self.kind = kind;
        self
    }

    /// This bookmark with the given remote URI
    pub fn with_uri(&self, uri: Url) -> Self {
        Self {
            uri: Some(uri),
            ..self.clone()
        }
    }

    /// This bookmark without a remote URI
    pub fn without_uri(&self) -> Self {
        Self {
            uri: None,
            ..self.clone()
        }
    }

    /// This bookmark relabelled as the current wire format.
    ///
    /// Changes the identity of bookmarks from older generations.
    pub fn upgraded(&self) -> Self {
        Self {
            format: BookmarkFormat::CURRENT,
            ..self.clone()
        }
    }

    /// Local book id derived from the OPDS id
    pub fn book_id(&self) -> BookId {
        BookId::from_opds_id(&self.opds_id)
    }

    pub fn is_explicit(&self) -> bool {
        self.kind == BookmarkKind::Explicit
    }

    pub fn is_last_read(&self) -> bool {
        self.kind == BookmarkKind::LastReadLocation
    }

    /// Content-derived identity of this bookmark
    pub fn bookmark_id(&self) -> BookmarkId {
        let mut digest = IdentityDigest::new();
        digest.push(&self.opds_id);
        self.location.add_to_digest(&mut digest);
        match self.format {
            BookmarkFormat::Legacy | BookmarkFormat::V20210317 => {
                digest.push(self.kind.motivation_uri());
            }
            BookmarkFormat::V20210828 => {
                digest.push(&format_time(&self.time));
            }
            BookmarkFormat::V20240424 => {}
        }
        BookmarkId(digest.finish())
    }

    /// True if the two bookmarks are equal once remote URIs are ignored
    pub fn is_interchangeable_with(&self, other: &Bookmark) -> bool {
        self == other || self.without_uri() == other.without_uri()
    }

    /// Checks every range constraint, including the locator's
    pub fn check(&self) -> CoreResult<()> {
        self.validate()
            .map_err(|errors| CoreError::InvalidBookmark(errors.join("; ")))
    }
}

impl Validator for Bookmark {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.location.check() {
            errors.push(e.to_string());
        }
        if !(0.0..=1.0).contains(&self.book_progress) {
            errors.push(format!("Book progress {} must be in [0.0, 1.0]", self.book_progress));
        }
        if !(0.0..=1.0).contains(&self.chapter_progress) {
            errors.push(format!(
                "Chapter progress {} must be in [0.0, 1.0]",
                self.chapter_progress
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
