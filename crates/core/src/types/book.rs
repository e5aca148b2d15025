//! Book identity and format

use crate::types::common::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a book in local storage.
///
/// Derived from the book's OPDS entry id so every device computes the same
/// value without coordination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    /// Derives the book id from the OPDS entry id
    pub fn from_opds_id(opds_id: &str) -> Self {
        Self(sha256_hex(opds_id))
    }

    /// Wraps an already derived id
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the BookId as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a book can be stored in. Each format has its own storage handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Epub,
    AudioBook,
    Pdf,
}

impl BookFormat {
    /// Lookup order used when loading bookmarks for a book
    pub const LOOKUP_ORDER: [BookFormat; 3] = [BookFormat::Epub, BookFormat::AudioBook, BookFormat::Pdf];
}

impl fmt::Display for BookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epub => write!(f, "epub"),
            Self::AudioBook => write!(f, "audiobook"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}
