//! # slack-chat-export
//!
//! A CLI tool that converts a [Slack](https://slack.com) workspace export
//! archive into a single chronologically ordered Markdown log.
//!
//! ## What it does
//!
//! Slack's export is a zip of JSON: `channels.json`, `users.json`, and one
//! JSON file per channel per day. This tool reads that archive, filters the
//! messages to the requested channels, users, and date range, renders each
//! message as Markdown, and writes one file grouped by date heading and
//! channel sub-heading. Attached images and text snippets are downloaded
//! into a local asset directory and embedded in the output.
//!
//! A "primary user" can be named: their messages are rendered as plain
//! first-person log entries, while everyone else's appear as quoted
//! dialogue with a bold author header.
//!
//! The archive is only ever read — nothing in it is modified.
//!
//! ## Usage
//!
//! ```sh
//! # Convert a whole workspace export
//! slack-chat-export "Slack export.zip"
//!
//! # A personal log: one channel, three users, alice in first person
//! slack-chat-export export.zip --me alice --users alice,bob,carol \
//!     --channels general --start-date 2018-01-01 --end-date 2019-01-01
//! ```
//!
//! Preferences can be persisted in `~/.config/slack-chat-export/config.toml`.
//!
//! ## Compatibility
//!
//! Tracks the (undocumented) layout of Slack's workspace export zips. If a
//! format change breaks parsing, please open an issue.

pub mod archive;
pub mod convert;
pub mod download;
pub mod error;
pub mod markdown;
pub mod model;
pub mod parser;
