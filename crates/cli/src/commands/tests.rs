use super::*;
use pagemark_core::{BookmarkFormat, Locator};
use serde_json::json;
use std::time::Duration;
use tempfile::NamedTempFile;

fn fallback() -> FallbackValues {
    FallbackValues::new(BookmarkKind::LastReadLocation, "Fallback Title", "urn:isbn:fallback")
}

fn write_temp(text: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), text).unwrap();
    file
}

fn legacy_page_json() -> String {
    json!({
        "opdsId": "urn:isbn:1",
        "time": "2020-01-01T00:00:00Z",
        "location": {"@type": "LocatorPage", "page": 3}
    })
    .to_string()
}

#[test]
fn test_parse_kind() {
    assert_eq!(parse_kind("explicit").unwrap(), BookmarkKind::Explicit);
    assert_eq!(parse_kind("last-read").unwrap(), BookmarkKind::LastReadLocation);
    assert_eq!(
        parse_kind("http://librarysimplified.org/terms/annotation/idling").unwrap(),
        BookmarkKind::LastReadLocation
    );
    assert!(parse_kind("highlight").is_err());
}

#[test]
fn test_read_current_bookmark() {
    let bookmark = Bookmark::new("urn:isbn:9", Locator::page(12).unwrap(), BookmarkKind::Explicit)
        .with_book_title("Nine");
    let file = write_temp(&BookmarkCodec::encode_string(&bookmark).unwrap());

    let decoded = read_bookmark(file.path(), &fallback()).unwrap();
    assert_eq!(decoded.bookmark_id(), bookmark.bookmark_id());
    assert_eq!(decoded.kind, BookmarkKind::Explicit);
    assert_eq!(decoded.format, BookmarkFormat::CURRENT);
}

#[test]
fn test_read_legacy_bookmark_uses_fallback_kind() {
    let file = write_temp(&legacy_page_json());

    let decoded = read_bookmark(file.path(), &fallback()).unwrap();
    assert_eq!(decoded.format, BookmarkFormat::Legacy);
    assert_eq!(decoded.kind, BookmarkKind::LastReadLocation);
    assert_eq!(decoded.location, Locator::Page { page_number: 3 });
}

#[test]
fn test_upgrade_output_decodes_as_current() {
    let file = write_temp(&legacy_page_json());
    let legacy = read_bookmark(file.path(), &fallback()).unwrap();

    let upgraded_text = BookmarkCodec::encode_pretty(&legacy.upgraded()).unwrap();
    let upgraded_file = write_temp(&upgraded_text);
    let upgraded = read_bookmark(upgraded_file.path(), &fallback()).unwrap();

    assert_eq!(upgraded.format, BookmarkFormat::CURRENT);
    assert_eq!(upgraded.location, legacy.location);
    assert_ne!(upgraded.bookmark_id(), legacy.bookmark_id());
}

#[test]
fn test_read_missing_file() {
    let err = read_bookmark(Path::new("/nonexistent/bookmark.json"), &fallback()).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_read_invalid_bookmark() {
    let file = write_temp(r#"{"opdsId": "urn:isbn:1", "location": {"@type": "LocatorPage", "page": -4}}"#);
    let err = read_bookmark(file.path(), &fallback()).unwrap_err();
    assert!(err.to_string().contains("Failed to decode"));
}

#[test]
fn test_describe_mentions_identity_and_location() {
    let bookmark = Bookmark::new(
        "urn:isbn:42",
        Locator::href_progression("/chapter1.xhtml", 0.5).unwrap(),
        BookmarkKind::Explicit,
    )
    .with_book_title("Answers")
    .with_chapter_title("One");

    let text = describe(&bookmark);
    assert!(text.contains(bookmark.bookmark_id().as_str()));
    assert!(text.contains("Answers (urn:isbn:42)"));
    assert!(text.contains("/chapter1.xhtml"));
    assert!(text.contains("Chapter: One"));
    assert!(!text.contains("URI:"));
}

#[test]
fn test_describe_shows_server_uri() {
    let bookmark = Bookmark::new("urn:isbn:1", Locator::page(1).unwrap(), BookmarkKind::Explicit)
        .with_uri(Url::parse("https://example.com/annotations/7").unwrap());
    let text = describe(&bookmark);
    assert!(text.contains("URI: https://example.com/annotations/7"));
    assert!(text.contains("Book: - (urn:isbn:1)"));
}

#[test]
fn test_client_config_follows_network_section() {
    let network = NetworkConfig {
        timeout_secs: 7,
        user_agent: "pagemark-test/1".to_string(),
    };
    let config = client_config(&network);
    assert_eq!(config.timeout, Duration::from_secs(7));
    assert_eq!(config.user_agent, "pagemark-test/1");
    assert_eq!(config.max_redirects, ClientConfig::default().max_redirects);
}
