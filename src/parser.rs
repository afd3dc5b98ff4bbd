//! Per-message rendering: author header, inline vs quoted-block layout,
//! Slack line-syntax rewrites, attachments, then the substitution passes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::download::Downloader;
use crate::error::{ExportError, Result};
use crate::markdown::MarkdownMessage;
use crate::model::Message;

pub struct MessageParser {
    downloader: Downloader,
    user_id_map: BTreeMap<String, String>,
    my_user_id: Option<String>,
}

impl MessageParser {
    pub fn new(
        user_id_map: BTreeMap<String, String>,
        my_user_id: Option<String>,
        asset_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            downloader: Downloader::new(asset_path)?,
            user_id_map,
            my_user_id,
        })
    }

    fn is_primary(&self, msg: &Message) -> bool {
        self.my_user_id.is_some() && msg.user_id() == self.my_user_id.as_deref()
    }

    /// Renders one message to its Markdown fragment. An empty fragment
    /// means the message produced no visible output and is dropped.
    pub fn parse(&self, msg: &Message) -> Result<String> {
        let mut md = MarkdownMessage::new();

        if msg.is_user_message() {
            let lines = msg.lines();

            // The primary user's own messages read as plain log entries,
            // so they get no author header.
            if !self.is_primary(msg) {
                let author = msg
                    .user_id()
                    .and_then(|id| self.user_id_map.get(id))
                    .ok_or_else(|| {
                        ExportError::Lookup(format!(
                            "no real name for author {}",
                            msg.user_id().unwrap_or("<none>")
                        ))
                    })?;
                md.push(&format!("**{author}**:"));
                if lines.len() + msg.num_files() > 1 {
                    md.newlines(2);
                    md.set_line_prefix("> ");
                } else {
                    md.push(" ");
                }
            }

            for line in &lines {
                if line.starts_with("• ") {
                    md.push(&line.replacen("• ", "* ", 1));
                } else if line.find("# ").is_some_and(|at| at < 5) {
                    // Slack exports top-level headings; demote them so the
                    // date headings stay the only H1s.
                    md.push(&line.replacen("# ", "## ", 1));
                } else {
                    md.push(line);
                }
                md.newline();
            }
        }

        md.sub_ids_with_realname(&self.user_id_map);

        for file in msg.files() {
            self.downloader.render(&file, &mut md)?;
        }

        md.sub_html_entities();

        Ok(md.into_string())
    }
}
