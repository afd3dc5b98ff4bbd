//! End-to-end tests over complete fixture archives written to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use slack_chat_export::archive::{Export, Scope};
use slack_chat_export::convert::{ConvertOptions, NoProgress, convert, list_channels, list_users};
use slack_chat_export::error::ExportError;

const CHANNELS: &str = r#"[{"id": "C01", "name": "general"}]"#;

const USERS: &str = r#"[
    {"id": "U01", "name": "alice", "profile": {"real_name": "Alice"}},
    {"id": "U02", "name": "bob", "profile": {"real_name": "Bob"}},
    {"id": "U03", "name": "carol", "profile": {"real_name": "Carol"}}
]"#;

fn write_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let zip_path = dir.join("export.zip");
    let file = fs::File::create(&zip_path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    zip_path
}

fn scoped(my_user_name: Option<&str>, users: Option<&[&str]>, channels: Option<&[&str]>) -> Scope {
    Scope {
        my_user_name: my_user_name.map(str::to_owned),
        users: users.map(|u| u.iter().map(|s| (*s).to_owned()).collect()),
        channels: channels.map(|c| c.iter().map(|s| (*s).to_owned()).collect()),
        ..Scope::default()
    }
}

#[test]
fn converts_a_two_user_channel_into_a_grouped_log() {
    let tmp = TempDir::new().unwrap();
    // alice listed first in the file; the output must re-sort by timestamp
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/2018-01-01.json",
                r#"[
                    {"user": "U01", "ts": "1001.0", "text": "hello"},
                    {"user": "U02", "ts": "1000.0", "text": "hi"},
                    {"user": "U02", "ts": "1002.0", "subtype": "channel_join", "text": "joined"},
                    {"user": "U03", "ts": "1003.0", "text": "hey"}
                ]"#,
            ),
        ],
    );

    let scope = scoped(Some("alice"), Some(&["alice", "bob"]), Some(&["general"]));
    let options = ConvertOptions {
        asset_path: tmp.path().join("assets"),
        out_dir: tmp.path().to_path_buf(),
    };
    let out_path = convert(&zip_path, &scope, &options, &mut NoProgress).unwrap();

    let export = Export::open(&zip_path, &scope).unwrap();
    let expected_name = format!("Alice_{}_{}.md", export.start_date(), export.end_date());
    assert_eq!(out_path.file_name().unwrap().to_str().unwrap(), expected_name);

    let log = fs::read_to_string(&out_path).unwrap();
    let h1_count = log.lines().filter(|l| l.starts_with("# ")).count();
    assert_eq!(h1_count, 1, "both messages fall on one day:\n{log}");
    assert_eq!(log.matches("### general").count(), 1);

    let bob = log.find("**Bob**: hi").expect("bob's message");
    let alice = log.find("hello").expect("alice's message");
    assert!(bob < alice, "lower timestamp must come first:\n{log}");

    // alice is primary: no header on her message
    assert!(!log.contains("**Alice**"));
    // carol is filtered out, the join event renders empty
    assert!(!log.contains("hey"));
    assert!(!log.contains("joined"));
}

#[test]
fn range_wider_than_the_archive_clamps_to_its_span() {
    let tmp = TempDir::new().unwrap();
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/1970-01-11.json",
                r#"[{"user": "U01", "ts": "864000.0", "text": "early"},
                    {"user": "U02", "ts": "1728000.0", "text": "late"}]"#,
            ),
        ],
    );

    let unbounded = Export::open(&zip_path, &Scope::default()).unwrap();
    let wide = Export::open(
        &zip_path,
        &Scope {
            start_date: Some("1969-01-01".parse().unwrap()),
            end_date: Some("2030-12-31".parse().unwrap()),
            ..Scope::default()
        },
    )
    .unwrap();

    assert_eq!(wide.start_date(), unbounded.start_date());
    assert_eq!(wide.end_date(), unbounded.end_date());
    assert_eq!(wide.num_messages(), unbounded.num_messages());
    // no primary user configured: the default display name applies
    assert_eq!(wide.primary_user(), "slack");
}

#[test]
fn narrow_range_filters_and_bounds_hold_inclusively() {
    let tmp = TempDir::new().unwrap();
    // ten days apart, so the cut stays on the same side of the boundary
    // in every timezone
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/1970-01-11.json",
                r#"[{"user": "U01", "ts": "864000.0", "text": "early"},
                    {"user": "U02", "ts": "1728000.0", "text": "late"}]"#,
            ),
        ],
    );

    let export = Export::open(
        &zip_path,
        &Scope {
            start_date: Some("1970-01-15".parse().unwrap()),
            ..Scope::default()
        },
    )
    .unwrap();

    assert_eq!(export.num_messages(), 1);
    for (channel, msg) in export.messages() {
        assert_eq!(channel, "general");
        assert_eq!(msg.user_id(), Some("U02"));
        assert!(msg.timestamp() >= 864000.0 && msg.timestamp() <= 1728000.0);
    }
}

#[test]
fn user_selection_restricts_the_stream() {
    let tmp = TempDir::new().unwrap();
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/2018-01-01.json",
                r#"[{"user": "U01", "ts": "1.0", "text": "a"},
                    {"user": "U02", "ts": "2.0", "text": "b"},
                    {"user": "U03", "ts": "3.0", "text": "c"}]"#,
            ),
        ],
    );

    let export = Export::open(&zip_path, &scoped(None, Some(&["alice", "U02"]), None)).unwrap();
    assert_eq!(export.num_messages(), 2);
    for (_, msg) in export.messages() {
        assert!(matches!(msg.user_id(), Some("U01") | Some("U02")));
    }
}

#[test]
fn listing_helpers_expose_the_name_sets() {
    let tmp = TempDir::new().unwrap();
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/2018-01-01.json",
                r#"[{"user": "U01", "ts": "1.0", "text": "a"}]"#,
            ),
        ],
    );

    let users = list_users(&zip_path).unwrap();
    assert!(users.contains("alice") && users.contains("bob") && users.contains("carol"));
    let channels = list_channels(&zip_path).unwrap();
    assert_eq!(channels.len(), 1);
    assert!(channels.contains("general"));
}

#[test]
fn missing_required_entry_is_an_archive_format_error() {
    let tmp = TempDir::new().unwrap();
    let zip_path = write_archive(tmp.path(), &[("users.json", USERS)]);

    assert!(matches!(
        Export::open(&zip_path, &Scope::default()),
        Err(ExportError::ArchiveFormat { .. })
    ));
}

#[test]
fn empty_selection_is_an_archive_format_error() {
    let tmp = TempDir::new().unwrap();
    let zip_path = write_archive(
        tmp.path(),
        &[
            ("channels.json", CHANNELS),
            ("users.json", USERS),
            (
                "general/2018-01-01.json",
                r#"[{"user": "U01", "ts": "1.0", "text": "a"}]"#,
            ),
        ],
    );

    assert!(matches!(
        Export::open(&zip_path, &scoped(None, None, Some(&["nosuch"]))),
        Err(ExportError::ArchiveFormat { .. })
    ));
}
