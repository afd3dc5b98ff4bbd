//! Thin typed views over the raw JSON records of an export archive.
//!
//! Slack's export records are heterogeneous by design (system events drop
//! fields that user messages carry), so the accessors here are permissive:
//! a missing optional field is an empty answer, never an error. The one
//! exception is `ts`, which every record must carry — it is parsed eagerly
//! so the rest of the pipeline can treat the timestamp as plain data.

use serde_json::{Map, Value};

/// One record as stored in `channels.json` / `users.json`.
pub type RawRecord = Map<String, Value>;

/// A single message from a channel's daily JSON file.
pub struct Message {
    data: RawRecord,
    ts: f64,
}

impl Message {
    /// Builds the view, parsing the `ts` field. `None` means the record is
    /// not an object or its timestamp is missing/unparseable — callers
    /// treat that as a malformed archive entry.
    pub fn from_value(value: Value) -> Option<Self> {
        let data = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        let ts = data.get("ts")?.as_str()?.parse::<f64>().ok()?;
        Some(Self { data, ts })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.get("user").and_then(Value::as_str)
    }

    /// Epoch seconds, fractional part preserved (Slack uses it to
    /// disambiguate ordering within a second).
    pub fn timestamp(&self) -> f64 {
        self.ts
    }

    /// A user message has an author and no `subtype`. Everything else
    /// (joins, edits, bot events) still flows through the pipeline for
    /// attachment handling but is not rendered as authored content.
    pub fn is_user_message(&self) -> bool {
        self.data.contains_key("user") && !self.data.contains_key("subtype")
    }

    /// Non-empty text lines; blank lines are dropped. A record without
    /// `text` simply has no lines.
    pub fn lines(&self) -> Vec<&str> {
        self.data
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or("")
            .split('\n')
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn files(&self) -> impl Iterator<Item = FileRef<'_>> {
        self.data
            .get("files")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .map(FileRef::new)
    }

    pub fn num_files(&self) -> usize {
        self.files().count()
    }
}

/// Coarse attachment kind: the portion of the MIME type before the `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Text,
    Other,
}

/// A view over one entry of a message's `files` array.
pub struct FileRef<'a> {
    data: &'a RawRecord,
}

impl<'a> FileRef<'a> {
    pub fn new(data: &'a RawRecord) -> Self {
        Self { data }
    }

    pub fn permalink(&self) -> Option<&'a str> {
        self.data.get("permalink").and_then(Value::as_str)
    }

    pub fn url_private(&self) -> Option<&'a str> {
        self.data.get("url_private").and_then(Value::as_str)
    }

    pub fn kind(&self) -> FileKind {
        let coarse = self
            .data
            .get("mimetype")
            .and_then(Value::as_str)
            .and_then(|m| m.split('/').next());
        match coarse {
            Some("image") => FileKind::Image,
            Some("text") => FileKind::Text,
            _ => FileKind::Other,
        }
    }

    /// Tombstoned/external files lose their permalink; those render as
    /// nothing unless their kind is still recognized.
    pub fn is_available(&self) -> bool {
        self.permalink().is_some()
    }
}
