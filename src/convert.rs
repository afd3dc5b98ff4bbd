//! Top-level pipeline: archive → parsed fragments → day/channel grouped
//! Markdown log, plus the listing helpers the CLI exposes.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::archive::{Export, Scope, format_day};
use crate::error::{ExportError, Result};
use crate::parser::MessageParser;

const SECONDS_IN_DAY: f64 = 86400.0;

/// Progress sink for the two conversion stages. Core logic reports through
/// this seam instead of touching the console; the CLI plugs in a progress
/// bar, tests plug in nothing.
pub trait Progress {
    fn begin(&mut self, _task: &str, _total: usize) {}
    fn step(&mut self) {}
    fn finish(&mut self) {}
}

/// Ignores every progress event.
pub struct NoProgress;

impl Progress for NoProgress {}

/// Where conversion output lands.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Directory for downloaded attachments.
    pub asset_path: PathBuf,
    /// Directory receiving the generated Markdown file.
    pub out_dir: PathBuf,
}

/// User names present in the archive.
pub fn list_users(zip_path: &Path) -> Result<BTreeSet<String>> {
    Ok(Export::open(zip_path, &Scope::default())?.user_names().clone())
}

/// Channel names present in the archive.
pub fn list_channels(zip_path: &Path) -> Result<BTreeSet<String>> {
    Ok(Export::open(zip_path, &Scope::default())?
        .channel_names()
        .clone())
}

/// Full load → parse → write pipeline. Returns the path of the written
/// Markdown file.
pub fn convert(
    zip_path: &Path,
    scope: &Scope,
    options: &ConvertOptions,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    let export = Export::open(zip_path, scope)?;
    convert_export(&export, options, progress)
}

/// Conversion over an already-opened export, so callers can inspect the
/// resolved selection (and report it) before the work starts.
pub fn convert_export(
    export: &Export,
    options: &ConvertOptions,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    let parser = MessageParser::new(
        export.user_id_map().clone(),
        export.my_user_id().map(str::to_owned),
        &options.asset_path,
    )?;

    // (day bucket, intra-day offset, channel, fragment)
    let mut entries: Vec<(i64, f64, &str, String)> = Vec::new();
    progress.begin("Converting messages and downloading assets", export.num_messages());
    for (channel, msg) in export.messages() {
        let fragment = parser.parse(msg)?;
        progress.step();
        if fragment.is_empty() {
            continue;
        }
        let ts = msg.timestamp();
        let day = ts.div_euclid(SECONDS_IN_DAY) as i64;
        let offset = ts - day as f64 * SECONDS_IN_DAY;
        entries.push((day, offset, channel, fragment));
    }
    progress.finish();

    entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let filename = format!(
        "{}_{}_{}.md",
        export.primary_user(),
        export.start_date(),
        export.end_date()
    );
    let out_path = options.out_dir.join(filename);
    let file = File::create(&out_path).map_err(|e| ExportError::filesystem(&out_path, e))?;
    let mut writer = BufWriter::new(file);
    let write_err = |e| ExportError::filesystem(&out_path, e);

    progress.begin("Writing messages", entries.len());
    let mut last_day: Option<i64> = None;
    let mut last_channel: Option<&str> = None;
    for (day, _, channel, fragment) in &entries {
        if last_day != Some(*day) {
            writeln!(writer, "# {}", format_day(*day as f64 * SECONDS_IN_DAY))
                .map_err(write_err)?;
            last_day = Some(*day);
            last_channel = None;
        }
        if last_channel != Some(*channel) {
            writeln!(writer, "### {channel}").map_err(write_err)?;
            last_channel = Some(*channel);
        }
        writeln!(writer, "{fragment}").map_err(write_err)?;
        progress.step();
    }
    writer.flush().map_err(write_err)?;
    progress.finish();

    Ok(out_path)
}
