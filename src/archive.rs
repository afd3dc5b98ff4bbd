//! Read side of the export: raw record stores for `channels.json` /
//! `users.json` and the filtered, time-bounded view over the archive's
//! message stream.
//!
//! The daily message entries are parsed exactly once, at `Export::open`
//! time, into an owned cache. Bounds computation, iteration, and counting
//! all borrow from that cache, so the zip is never re-read.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde_json::Value;
use zip::ZipArchive;

use crate::error::{ExportError, Result};
use crate::model::{Message, RawRecord};

/// Identifier fields honored by `RecordStore::find`, in priority order.
/// A `profile.` prefix reaches into the nested profile object.
pub const CHANNEL_ALIASES: &[&str] = &["id", "name"];
pub const USER_ALIASES: &[&str] = &["id", "name", "profile.real_name", "profile.display_name"];

/// Local calendar date of an epoch timestamp as `YYYY-MM-DD`.
pub fn format_day(ts: f64) -> String {
    DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn date_to_ts(date: NaiveDate) -> f64 {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp() as f64)
        // midnight can fall in a DST gap; read it as UTC then
        .unwrap_or_else(|| midnight.and_utc().timestamp() as f64)
}

/// The records of one entity kind (channels or users), as loaded from a
/// JSON array entry of the archive.
pub struct RecordStore {
    records: Vec<RawRecord>,
    alias_fields: &'static [&'static str],
}

impl RecordStore {
    pub fn load<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        entry_name: &str,
        alias_fields: &'static [&'static str],
    ) -> Result<Self> {
        let entry = archive
            .by_name(entry_name)
            .map_err(|e| ExportError::archive_format(entry_name, e.to_string()))?;
        let values: Vec<Value> = serde_json::from_reader(entry)
            .map_err(|e| ExportError::archive_format(entry_name, e.to_string()))?;

        let mut records = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::Object(map) => records.push(map),
                _ => {
                    return Err(ExportError::archive_format(
                        entry_name,
                        "expected an array of objects",
                    ));
                }
            }
        }
        Ok(Self {
            records,
            alias_fields,
        })
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    fn field<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
        match path.split_once('.') {
            Some((head, rest)) => record.get(head)?.as_object()?.get(rest),
            None => record.get(path),
        }
    }

    /// First record (in file order) whose alias fields contain `value`.
    pub fn find(&self, value: &str) -> Option<&RawRecord> {
        self.records.iter().find(|record| {
            self.alias_fields
                .iter()
                .any(|f| Self::field(record, f).and_then(Value::as_str) == Some(value))
        })
    }

    /// Set-valued projection of `key`. Records missing the key are skipped
    /// (the lists are heterogeneous). With a restriction, each value is
    /// resolved through `find` first and unresolved ones are ignored.
    pub fn values_of(&self, key: &str, restrict_to: Option<&[String]>) -> BTreeSet<String> {
        let project = |record: &RawRecord| {
            record
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        match restrict_to {
            None => self.records.iter().filter_map(project).collect(),
            Some(values) => values
                .iter()
                .filter_map(|v| self.find(v))
                .filter_map(project)
                .collect(),
        }
    }
}

/// Scoping applied when opening an export archive. All fields optional;
/// the default scope selects everything.
#[derive(Default, Clone)]
pub struct Scope {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub my_user_name: Option<String>,
    pub users: Option<Vec<String>>,
    pub channels: Option<Vec<String>>,
}

/// A Slack workspace export, scoped to the selected channels, users, and
/// date range.
pub struct Export {
    channel_names: BTreeSet<String>,
    user_names: BTreeSet<String>,
    user_ids: BTreeSet<String>,
    user_id_map: BTreeMap<String, String>,
    my_user_id: Option<String>,
    start_ts: f64,
    end_ts: f64,
    /// Channel-filtered, range-unfiltered stream in archive entry order.
    messages: Vec<(String, Message)>,
}

impl Export {
    pub fn open(zip_path: &Path, scope: &Scope) -> Result<Self> {
        let file = File::open(zip_path).map_err(|e| ExportError::filesystem(zip_path, e))?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| ExportError::archive_format(zip_path.display().to_string(), e.to_string()))?;

        let channels = RecordStore::load(&mut archive, "channels.json", CHANNEL_ALIASES)?;
        let users = RecordStore::load(&mut archive, "users.json", USER_ALIASES)?;

        let channel_names = channels.values_of("name", scope.channels.as_deref());
        let user_names = users.values_of("name", scope.users.as_deref());
        let user_ids = users.values_of("id", scope.users.as_deref());

        let my_user_id = scope
            .my_user_name
            .as_deref()
            .and_then(|name| users.find(name))
            .and_then(|record| record.get("id").and_then(Value::as_str))
            .map(str::to_owned);

        let mut user_id_map = BTreeMap::new();
        for record in users.records() {
            let id = record.get("id").and_then(Value::as_str);
            let real_name = RecordStore::field(record, "profile.real_name").and_then(Value::as_str);
            if let (Some(id), Some(real_name)) = (id, real_name) {
                user_id_map.insert(id.to_owned(), real_name.to_owned());
            }
        }

        let messages = read_messages(&mut archive, &channel_names)?;
        if messages.is_empty() {
            return Err(ExportError::archive_format(
                zip_path.display().to_string(),
                "no messages in the selected channels",
            ));
        }

        let min_ts = messages
            .iter()
            .map(|(_, m)| m.timestamp())
            .fold(f64::INFINITY, f64::min);
        let max_ts = messages
            .iter()
            .map(|(_, m)| m.timestamp())
            .fold(f64::NEG_INFINITY, f64::max);

        // Requested bounds never widen past what the archive actually holds.
        let start_ts = match scope.start_date {
            Some(date) => date_to_ts(date).max(min_ts),
            None => min_ts,
        };
        let end_ts = match scope.end_date {
            Some(date) => date_to_ts(date).min(max_ts),
            None => max_ts,
        };

        Ok(Self {
            channel_names,
            user_names,
            user_ids,
            user_id_map,
            my_user_id,
            start_ts,
            end_ts,
            messages,
        })
    }

    pub fn channel_names(&self) -> &BTreeSet<String> {
        &self.channel_names
    }

    pub fn user_names(&self) -> &BTreeSet<String> {
        &self.user_names
    }

    /// Id → real name over every user record carrying both fields.
    pub fn user_id_map(&self) -> &BTreeMap<String, String> {
        &self.user_id_map
    }

    pub fn my_user_id(&self) -> Option<&str> {
        self.my_user_id.as_deref()
    }

    /// Real name of the primary user, or `"slack"` when none is configured
    /// or the identifier did not resolve.
    pub fn primary_user(&self) -> String {
        self.my_user_id
            .as_deref()
            .and_then(|id| self.user_id_map.get(id))
            .cloned()
            .unwrap_or_else(|| "slack".to_owned())
    }

    pub fn start_date(&self) -> String {
        format_day(self.start_ts)
    }

    pub fn end_date(&self) -> String {
        format_day(self.end_ts)
    }

    fn in_range(&self, msg: &Message) -> bool {
        msg.user_id().is_some_and(|id| self.user_ids.contains(id))
            && msg.timestamp() >= self.start_ts
            && msg.timestamp() <= self.end_ts
    }

    /// The selected stream: author in the selected user set, timestamp
    /// within the clamped bounds (inclusive). Order follows archive entry
    /// enumeration, then in-file order — not globally chronological.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.messages
            .iter()
            .filter(|(_, msg)| self.in_range(msg))
            .map(|(channel, msg)| (channel.as_str(), msg))
    }

    pub fn num_messages(&self) -> usize {
        self.messages().count()
    }
}

fn read_messages<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    channel_names: &BTreeSet<String>,
) -> Result<Vec<(String, Message)>> {
    let mut out = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| ExportError::archive_format(format!("#{index}"), e.to_string()))?;
        let name = entry.name().to_owned();
        let channel = name.split('/').next().unwrap_or("");
        if !channel_names.contains(channel) || !name.ends_with(".json") {
            continue;
        }
        let records: Vec<Value> = serde_json::from_reader(entry)
            .map_err(|e| ExportError::archive_format(name.as_str(), e.to_string()))?;
        for value in records {
            let msg = Message::from_value(value).ok_or_else(|| {
                ExportError::archive_format(name.as_str(), "message record without a parseable ts")
            })?;
            out.push((channel.to_owned(), msg));
        }
    }
    Ok(out)
}
