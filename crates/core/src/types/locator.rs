//! Locators: where in a book a bookmark points
//!
//! Each variant belongs to one reading technology. Range constraints are
//! checked by the validating constructors and by [`Locator::check`], which
//! decoders call before handing a locator out.

use crate::error::{CoreError, CoreResult};
use crate::types::common::IdentityDigest;
use serde::{Deserialize, Serialize};

/// Format-specific position inside a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// EPUB position from the original reader engine
    LegacyCfi {
        id_ref: Option<String>,
        content_cfi: Option<String>,
        chapter_progression: f64,
    },
    /// EPUB position as a chapter href plus progress within that chapter
    HrefProgression { href: String, chapter_progress: f64 },
    /// PDF page
    Page { page_number: i64 },
    /// Audiobook position addressed by part and chapter
    AudioBookTimeV1 {
        audio_book_id: String,
        part: i64,
        chapter: i64,
        duration_ms: i64,
        start_offset_ms: i64,
        time_ms: i64,
        title: String,
    },
    /// Audiobook position addressed by reading order item
    AudioBookTimeV2 {
        reading_order_item_href: String,
        offset_ms: i64,
    },
}

impl Locator {
    /// EPUB href/progression locator
    pub fn href_progression(href: impl Into<String>, chapter_progress: f64) -> CoreResult<Self> {
        let locator = Self::HrefProgression {
            href: href.into(),
            chapter_progress,
        };
        locator.check()?;
        Ok(locator)
    }

    /// Legacy CFI locator
    pub fn legacy_cfi(
        id_ref: Option<String>,
        content_cfi: Option<String>,
        chapter_progression: f64,
    ) -> CoreResult<Self> {
        let locator = Self::LegacyCfi {
            id_ref,
            content_cfi,
            chapter_progression,
        };
        locator.check()?;
        Ok(locator)
    }

    /// PDF page locator
    pub fn page(page_number: i64) -> CoreResult<Self> {
        let locator = Self::Page { page_number };
        locator.check()?;
        Ok(locator)
    }

    /// Canonical `@type` name written on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LegacyCfi { .. } => "LocatorLegacyCFI",
            Self::HrefProgression { .. } => "LocatorHrefProgression",
            Self::Page { .. } => "LocatorPage",
            Self::AudioBookTimeV1 { .. } | Self::AudioBookTimeV2 { .. } => "LocatorAudioBookTime",
        }
    }

    /// `@version` written on the wire, where the type carries one
    pub fn type_version(&self) -> Option<i64> {
        match self {
            Self::AudioBookTimeV1 { .. } => Some(1),
            Self::AudioBookTimeV2 { .. } => Some(2),
            _ => None,
        }
    }

    /// Progress within the current chapter, when the locator knows it
    pub fn chapter_progress(&self) -> Option<f64> {
        match self {
            Self::LegacyCfi {
                chapter_progression, ..
            } => Some(*chapter_progression),
            Self::HrefProgression {
                chapter_progress, ..
            } => Some(*chapter_progress),
            _ => None,
        }
    }

    /// Audiobook position with the chapter start offset removed
    pub fn time_without_offset(&self) -> Option<i64> {
        match self {
            Self::AudioBookTimeV1 {
                time_ms,
                start_offset_ms,
                ..
            } => Some(time_ms - start_offset_ms),
            Self::AudioBookTimeV2 { offset_ms, .. } => Some(*offset_ms),
            _ => None,
        }
    }

    /// Checks the range constraints of this locator
    pub fn check(&self) -> CoreResult<()> {
        match self {
            Self::LegacyCfi {
                chapter_progression, ..
            } => check_progress(*chapter_progression),
            Self::HrefProgression {
                chapter_progress, ..
            } => check_progress(*chapter_progress),
            Self::Page { page_number } => {
                if *page_number < 0 {
                    return Err(CoreError::InvalidLocator(format!(
                        "Page number {} must be non-negative.",
                        page_number
                    )));
                }
                Ok(())
            }
            Self::AudioBookTimeV1 { part, chapter, .. } => {
                if *chapter < 0 {
                    return Err(CoreError::InvalidLocator(format!(
                        "Chapter {} must be non-negative.",
                        chapter
                    )));
                }
                if *part < 0 {
                    return Err(CoreError::InvalidLocator(format!(
                        "Part {} must be non-negative.",
                        part
                    )));
                }
                Ok(())
            }
            Self::AudioBookTimeV2 { .. } => Ok(()),
        }
    }

    /// Feeds the identity-relevant fields into `digest`, in fixed order
    pub fn add_to_digest(&self, digest: &mut IdentityDigest) {
        match self {
            Self::LegacyCfi {
                id_ref, content_cfi, ..
            } => {
                if let Some(cfi) = content_cfi {
                    digest.push(cfi);
                }
                if let Some(id_ref) = id_ref {
                    digest.push(id_ref);
                }
            }
            Self::HrefProgression {
                href,
                chapter_progress,
            } => {
                digest.push(href);
                digest.push(&format!("{:.6}", chapter_progress));
            }
            Self::Page { page_number } => {
                digest.push_display(page_number);
            }
            Self::AudioBookTimeV1 {
                audio_book_id,
                part,
                chapter,
                duration_ms,
                start_offset_ms,
                time_ms,
                title,
            } => {
                digest
                    .push(audio_book_id)
                    .push_display(chapter)
                    .push_display(duration_ms)
                    .push_display(part)
                    .push_display(start_offset_ms)
                    .push_display(time_ms)
                    .push(title);
            }
            Self::AudioBookTimeV2 {
                reading_order_item_href,
                offset_ms,
            } => {
                digest.push(reading_order_item_href).push_display(offset_ms);
            }
        }
    }
}

fn check_progress(progress: f64) -> CoreResult<()> {
    if !(0.0..=1.0).contains(&progress) {
        return Err(CoreError::InvalidLocator(format!(
            "Chapter progress {} must be in [0.0, 1.0]",
            progress
        )));
    }
    Ok(())
}
