// crates/sync-engine/src/normalize.rs
//! Identity-keyed merge of bookmark collections

use pagemark_core::{Bookmark, BookmarkId};
use std::collections::{BTreeMap, HashSet};

/// Merges `incoming` into `existing`.
///
/// The result is ordered by bookmark ID. An existing bookmark with the same
/// ID as `incoming` is replaced; bookmarks with distinct IDs coexist.
pub fn normalize(existing: &[Bookmark], incoming: Bookmark) -> Vec<Bookmark> {
    let mut by_id: BTreeMap<BookmarkId, Bookmark> = existing
        .iter()
        .map(|bookmark| (bookmark.bookmark_id(), bookmark.clone()))
        .collect();
    by_id.insert(incoming.bookmark_id(), incoming);
    by_id.into_values().collect()
}

/// Explicit local bookmarks the server does not know about.
///
/// Local bookmarks are compared in their upgraded form, since that is what
/// gets uploaded and what the server hands back.
pub fn local_extras(local: &[Bookmark], received: &[Bookmark]) -> Vec<Bookmark> {
    let remote: HashSet<BookmarkId> = received.iter().map(Bookmark::bookmark_id).collect();
    let mut extras: BTreeMap<BookmarkId, Bookmark> = BTreeMap::new();
    for bookmark in local.iter().filter(|b| b.is_explicit()) {
        let id = bookmark.upgraded().bookmark_id();
        if !remote.contains(&id) {
            extras.insert(id, bookmark.clone());
        }
    }
    extras.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{BookmarkFormat, BookmarkKind, Locator};
    use url::Url;

    fn at(progress: f64) -> Bookmark {
        Bookmark::new(
            "urn:isbn:1",
            Locator::href_progression("/ch1", progress).unwrap(),
            BookmarkKind::Explicit,
        )
    }

    #[test]
    fn test_same_id_replaces() {
        let local = at(0.5);
        let remote = at(0.5).with_uri(Url::parse("https://example.com/a/1").unwrap());
        assert_eq!(local.bookmark_id(), remote.bookmark_id());

        let merged = normalize(&[local], remote.clone());
        assert_eq!(merged, vec![remote]);
    }

    #[test]
    fn test_distinct_ids_coexist() {
        let merged = normalize(&[at(0.1)], at(0.2));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&[at(0.1), at(0.2)], at(0.2));
        let twice = normalize(&once, at(0.2));
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn test_result_ordered_by_id() {
        let merged = normalize(&[at(0.3), at(0.1)], at(0.2));
        let ids: Vec<_> = merged.iter().map(Bookmark::bookmark_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_local_extras() {
        let shared = at(0.1);
        let local_only = at(0.2);
        let last_read = at(0.3).with_kind(BookmarkKind::LastReadLocation);
        let extras = local_extras(&[shared.clone(), local_only.clone(), last_read], &[shared]);
        assert_eq!(extras, vec![local_only]);
    }

    #[test]
    fn test_local_extras_compares_upgraded_form() {
        let legacy = at(0.4).with_format(BookmarkFormat::Legacy);
        let received = vec![legacy.upgraded()];
        assert!(local_extras(&[legacy], &received).is_empty());
    }
}
