#![forbid(unsafe_code)]

//! Entities persisted by the store plus the bundle type used to carry
//! maintenance results around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of feed a `StreamSource` points at. Only `Youtube` has a fetch
/// strategy; `Directory` has a placeholder one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSourceType {
    Youtube,
    Odysee,
    Directory,
    Other,
}

impl StreamSourceType {
    /// Guesses the type from a URI the way users paste them in.
    pub fn from_uri(uri: &str) -> Self {
        let lower = uri.trim().to_ascii_lowercase();
        if lower.contains("youtube.com") || lower.contains("youtu.be") {
            Self::Youtube
        } else if lower.contains("odysee.com") {
            Self::Odysee
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Other
        } else {
            Self::Directory
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Odysee => "odysee",
            Self::Directory => "directory",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "youtube" => Self::Youtube,
            "odysee" => Self::Odysee,
            "directory" => Self::Directory,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub is_web: bool,
    pub source_type: StreamSourceType,
    pub enable_fetch: bool,
    pub background_content: bool,
    pub last_fetched: Option<DateTime<Utc>>,
    pub last_successful_fetched: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_fetched_ids: Vec<String>,
    pub added: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
}

impl StreamSource {
    pub fn new(name: impl Into<String>, uri: impl Into<String>, enable_fetch: bool) -> Self {
        let uri = uri.into();
        let source_type = StreamSourceType::from_uri(&uri);
        Self {
            id: new_id(),
            name: name.into(),
            is_web: source_type != StreamSourceType::Directory,
            source_type,
            uri,
            enable_fetch,
            background_content: false,
            last_fetched: None,
            last_successful_fetched: None,
            last_fetched_ids: Vec::new(),
            added: Utc::now(),
            deleted: None,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} - {} ({}, fetch {})",
            self.name,
            self.uri,
            self.source_type.as_str(),
            if self.enable_fetch { "on" } else { "off" }
        )
    }

    pub fn details(&self, include_uri: bool, include_id: bool) -> String {
        let mut out = self.name.clone();
        if include_uri {
            out.push_str(&format!(" | {}", self.uri));
        }
        if include_id {
            out.push_str(&format!(" | {}", self.id));
        }
        match self.last_fetched {
            Some(at) => out.push_str(&format!(" | last fetched {}", at.format("%Y-%m-%d %H:%M"))),
            None => out.push_str(" | never fetched"),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStream {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub is_web: bool,
    pub stream_source_id: Option<String>,
    pub watched: Option<DateTime<Utc>>,
    pub background_content: bool,
    pub added: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
}

impl QueueStream {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            id: new_id(),
            name: name.into(),
            is_web: uri.starts_with("http://") || uri.starts_with("https://"),
            uri,
            stream_source_id: None,
            watched: None,
            background_content: false,
            added: Utc::now(),
            deleted: None,
        }
    }

    pub fn details(&self, include_uri: bool, include_id: bool) -> String {
        let mut out = self.name.clone();
        if include_uri {
            out.push_str(&format!(" | {}", self.uri));
        }
        if include_id {
            out.push_str(&format!(" | {}", self.id));
        }
        if self.watched.is_some() {
            out.push_str(" | watched");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub play_watched_streams: bool,
    pub allow_duplicates: bool,
    #[serde(default)]
    pub stream_ids: Vec<String>,
    #[serde(default)]
    pub stream_source_ids: Vec<String>,
    pub added: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            play_watched_streams: true,
            allow_duplicates: true,
            stream_ids: Vec::new(),
            stream_source_ids: Vec::new(),
            added: Utc::now(),
            deleted: None,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({} streams, {} sources)",
            self.name,
            self.stream_ids.len(),
            self.stream_source_ids.len()
        )
    }

    pub fn details(&self, include_id: bool) -> String {
        let mut out = format!(
            "{} | replay watched: {} | duplicates: {}",
            self.name, self.play_watched_streams, self.allow_duplicates
        );
        if include_id {
            out.push_str(&format!(" | {}", self.id));
        }
        out
    }
}

/// Lists of entities grouped by kind. Used for prune/purge previews and
/// search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBundle {
    pub playlists: Vec<Playlist>,
    pub queue_streams: Vec<QueueStream>,
    pub stream_sources: Vec<StreamSource>,
}

impl EntityBundle {
    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty() && self.queue_streams.is_empty() && self.stream_sources.is_empty()
    }
}
