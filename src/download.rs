//! Attachment handling: fetch file bytes over HTTP and render the
//! per-kind Markdown (cached image links, quoted text excerpts, bare
//! links for everything else that still has a permalink).

use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;

use crate::error::{ExportError, Result};
use crate::markdown::MarkdownMessage;
use crate::model::{FileKind, FileRef};

/// Quoted text attachments are cut off after this many lines.
const MAX_TEXT_FILE_LINES: usize = 10;

pub struct Downloader {
    client: Client,
    asset_path: PathBuf,
}

impl Downloader {
    /// Creates the asset directory if it does not exist yet.
    pub fn new(asset_path: impl Into<PathBuf>) -> Result<Self> {
        let asset_path = asset_path.into();
        fs::create_dir_all(&asset_path).map_err(|e| ExportError::filesystem(&asset_path, e))?;
        Ok(Self {
            client: Client::new(),
            asset_path,
        })
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let network_err = |source| ExportError::Network {
            url: url.to_owned(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(network_err)?;
        let bytes = response.bytes().map_err(network_err)?;
        Ok(bytes.to_vec())
    }

    /// Renders one attachment into `md`, downloading as needed.
    /// Unavailable files of unrecognized kind produce nothing.
    pub fn render(&self, file: &FileRef, md: &mut MarkdownMessage) -> Result<()> {
        match file.kind() {
            FileKind::Image => {
                self.render_image(file, md)?;
                md.newline();
            }
            FileKind::Text => {
                self.render_text(file, md)?;
                md.newline();
            }
            FileKind::Other => {
                if let Some(permalink) = file.permalink() {
                    md.push(&format!("[{permalink}]({permalink})"));
                    md.newline();
                }
            }
        }
        Ok(())
    }

    fn render_image(&self, file: &FileRef, md: &mut MarkdownMessage) -> Result<()> {
        let permalink = required(file.permalink(), "permalink")?;
        let url = required(file.url_private(), "url_private")?;
        let filepath = self.asset_path.join(asset_filename(permalink));
        if !filepath.exists() {
            let data = self.fetch(url)?;
            fs::write(&filepath, data).map_err(|e| ExportError::filesystem(&filepath, e))?;
        }
        md.push(&format!("![{}]({})", permalink, filepath.display()));
        Ok(())
    }

    fn render_text(&self, file: &FileRef, md: &mut MarkdownMessage) -> Result<()> {
        let permalink = required(file.permalink(), "permalink")?;
        let url = required(file.url_private(), "url_private")?;
        md.push(&format!("[{permalink}]({permalink}):"));
        let data = self.fetch(url)?;
        let text = String::from_utf8_lossy(&data).into_owned();
        quote_excerpt(md, &text.split('\n').collect::<Vec<_>>());
        Ok(())
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| ExportError::Lookup(format!("attachment record is missing {field}")))
}

/// Asset filename derived from the last three permalink path segments,
/// joined with hyphens. Stable per permalink, so a file referenced twice
/// is only downloaded once.
fn asset_filename(permalink: &str) -> String {
    let segments: Vec<&str> = permalink.split('/').collect();
    let start = segments.len().saturating_sub(3);
    segments[start..].join("-")
}

fn quote_excerpt(md: &mut MarkdownMessage, lines: &[&str]) {
    for line in lines.iter().take(MAX_TEXT_FILE_LINES) {
        md.newline();
        md.push(&format!("> {line}"));
    }
    let remaining = lines.len().saturating_sub(MAX_TEXT_FILE_LINES);
    if remaining > 0 {
        md.newline();
        md.push(&format!("> ... *({remaining} lines remaining)*"));
    }
}
