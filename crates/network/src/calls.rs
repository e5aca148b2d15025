// crates/network/src/calls.rs
//! The annotation server protocol

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use pagemark_core::{AccountCredentials, Bookmark};
use pagemark_wire::{decode_annotation_list, decode_created_id, BookmarkAnnotation};
use serde_json::{json, Value};
use url::Url;

/// Patron setting that controls annotation sync
pub const SYNC_SETTING_KEY: &str = "simplified:synchronize_annotations";

pub const ANNOTATION_CONTENT_TYPE: &str = "application/ld+json";
pub const PROFILE_CONTENT_TYPE: &str = "vnd.librarysimplified/user-profile+json";

/// Remote calls needed to synchronize bookmarks.
///
/// Implementations block; they are only ever called from the sync worker.
pub trait BookmarkHttpCalls: Send + Sync {
    /// Whether the patron currently permits annotation sync
    fn syncing_is_enabled(&self, settings_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<bool>;

    /// Turns annotation sync on or off for the patron
    fn syncing_enable(
        &self,
        settings_uri: &Url,
        credentials: &AccountCredentials,
        enabled: bool,
    ) -> NetworkResult<()>;

    /// Fetches every bookmark stored on the server.
    ///
    /// Items that fail to decode are logged and left out.
    fn bookmarks_get(&self, annotations_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<Vec<Bookmark>>;

    /// Uploads a bookmark and returns the URI the server assigned to it
    fn bookmark_add(
        &self,
        annotations_uri: &Url,
        credentials: &AccountCredentials,
        bookmark: &Bookmark,
    ) -> NetworkResult<Url>;

    /// Deletes a bookmark by its server URI
    fn bookmark_delete(&self, bookmark_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<()>;
}

/// Reads the sync permission from a patron settings document.
///
/// An absent flag means the server has no opinion, which permits sync.
pub fn parse_sync_setting(document: &Value) -> bool {
    match document.get("settings").and_then(|settings| settings.get(SYNC_SETTING_KEY)) {
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
        Some(Value::Null) | None => true,
        Some(other) => {
            log::warn!("unexpected {} value: {}", SYNC_SETTING_KEY, other);
            false
        }
    }
}

/// Builds the settings document sent to enable or disable sync
pub fn sync_setting_document(enabled: bool) -> Value {
    json!({ "settings": { SYNC_SETTING_KEY: enabled } })
}

/// [`BookmarkHttpCalls`] over HTTP
#[derive(Clone)]
pub struct HttpBookmarkCalls {
    client: Client,
}

impl HttpBookmarkCalls {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn read_json(response: reqwest::blocking::Response) -> NetworkResult<Value> {
        let text = response.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl BookmarkHttpCalls for HttpBookmarkCalls {
    fn syncing_is_enabled(&self, settings_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<bool> {
        let response = self.client.get(settings_uri, credentials)?;
        let document = Self::read_json(response)?;
        Ok(parse_sync_setting(&document))
    }

    fn syncing_enable(
        &self,
        settings_uri: &Url,
        credentials: &AccountCredentials,
        enabled: bool,
    ) -> NetworkResult<()> {
        let body = serde_json::to_vec(&sync_setting_document(enabled))?;
        self.client
            .put(settings_uri, credentials, PROFILE_CONTENT_TYPE, body)?;
        Ok(())
    }

    fn bookmarks_get(&self, annotations_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<Vec<Bookmark>> {
        let response = self.client.get(annotations_uri, credentials)?;
        let document = Self::read_json(response)?;
        let list = decode_annotation_list(&document)?;
        for failure in &list.failures {
            log::error!("failed to parse bookmark: {}", failure);
        }
        Ok(list.bookmarks)
    }

    fn bookmark_add(
        &self,
        annotations_uri: &Url,
        credentials: &AccountCredentials,
        bookmark: &Bookmark,
    ) -> NetworkResult<Url> {
        let annotation = BookmarkAnnotation::from_bookmark(bookmark)?;
        let body = serde_json::to_vec(&annotation)?;
        let response = self
            .client
            .post(annotations_uri, credentials, ANNOTATION_CONTENT_TYPE, body)?;
        let document = Self::read_json(response)?;
        decode_created_id(&document).map_err(NetworkError::from)
    }

    fn bookmark_delete(&self, bookmark_uri: &Url, credentials: &AccountCredentials) -> NetworkResult<()> {
        self.client.delete(bookmark_uri, credentials)?;
        Ok(())
    }
}
