//! Comic records as fetched, cached and served.
//!
//! The serialized form is the wire format consumed by the front-end:
//!
//! ```json
//! { "name": "XKCD", "linkUrl": "https://xkcd.com/",
//!   "data": { "media": [{ "type": "image", "href": "https://..." }], "errors": [] },
//!   "updated": 1737331200000 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generic error appended when a fetch produced neither media nor errors.
pub const COULD_NOT_LOAD: &str = "Could not load comic";

/// Cache snapshot: source name to its last accepted entry.
pub type ComicSnapshot = BTreeMap<String, Comic>;

/// Kind of a single media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Text,
    Title,
    Html,
    /// Embedded video, identified by an external video id.
    #[serde(rename = "youtube", alias = "embeddedVideo")]
    EmbeddedVideo,
}

/// One unit of displayable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Media {
    pub fn image(href: impl Into<String>) -> Self {
        Self { kind: MediaKind::Image, href: Some(href.into()), content: None, id: None }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self { kind: MediaKind::Text, href: None, content: Some(content.into()), id: None }
    }

    pub fn title(content: impl Into<String>) -> Self {
        Self { kind: MediaKind::Title, href: None, content: Some(content.into()), id: None }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self { kind: MediaKind::Html, href: None, content: Some(content.into()), id: None }
    }

    pub fn video(id: impl Into<String>) -> Self {
        Self { kind: MediaKind::EmbeddedVideo, href: None, content: None, id: Some(id.into()) }
    }

    /// True when at least one payload field carries a non-blank value.
    pub fn has_payload(&self) -> bool {
        [&self.href, &self.content, &self.id]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// Result of one fetch attempt for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComicData {
    /// Media in display order.
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Pages traversed before reaching the final content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_urls: Option<Vec<String>>,
}

impl ComicData {
    pub fn from_media(media: Vec<Media>) -> Self {
        Self { media, ..Default::default() }
    }

    /// A record holding a single error message and no media.
    pub fn error(message: impl Into<String>) -> Self {
        Self { errors: vec![message.into()], ..Default::default() }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Drop media without payload and make sure the record is never silently empty.
    pub fn validate(&mut self) {
        self.media.retain(Media::has_payload);
        if self.media.is_empty() && self.errors.is_empty() {
            self.errors.push(COULD_NOT_LOAD.to_string());
        }
    }

    /// Append a traversed URL to `intermediate_urls`.
    pub fn push_intermediate(&mut self, url: impl Into<String>) {
        self.intermediate_urls.get_or_insert_with(Vec::new).push(url.into());
    }
}

/// One source's persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub name: String,
    pub link_url: String,
    pub data: ComicData,
    /// Epoch milliseconds of the fetch that produced `data`.
    pub updated: i64,
}

impl Comic {
    /// Error entry for a fetch that failed before producing any content.
    pub fn failed(
        name: impl Into<String>, link_url: impl Into<String>, message: impl Into<String>, intermediate_urls: Vec<String>,
        updated: i64,
    ) -> Self {
        let mut data = ComicData::error(message);
        if !intermediate_urls.is_empty() {
            data.intermediate_urls = Some(intermediate_urls);
        }
        Self { name: name.into(), link_url: link_url.into(), data, updated }
    }

    /// Milliseconds elapsed since this entry was fetched.
    pub fn age(&self, now_ms: i64) -> i64 {
        now_ms - self.updated
    }

    pub fn has_errors(&self) -> bool {
        self.data.has_errors()
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
