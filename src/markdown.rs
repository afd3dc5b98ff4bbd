use std::collections::BTreeMap;

/// Hard line break. Pandoc-style Markdown collapses a bare newline into a
/// space unless the line ends with two spaces.
pub const LINE_BREAK: &str = "  \n";

/// Accumulator for the rendered Markdown of exactly one message.
///
/// The line prefix is prepended on every `push`, which is how quoted block
/// mode (`"> "`) applies to the rest of a message without the caller
/// tracking it per line.
#[derive(Default)]
pub struct MarkdownMessage {
    text: String,
    line_prefix: String,
}

impl MarkdownMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, s: &str) {
        self.text.push_str(&self.line_prefix);
        self.text.push_str(s);
    }

    pub fn newline(&mut self) {
        self.text.push_str(LINE_BREAK);
    }

    pub fn newlines(&mut self, num: usize) {
        for _ in 0..num {
            self.newline();
        }
    }

    pub fn set_line_prefix(&mut self, prefix: &str) {
        self.line_prefix = prefix.to_owned();
    }

    /// Expand `<@ID>` mentions to `@Real Name:` for every known user.
    /// The map is ordered, so substitution order is deterministic.
    pub fn sub_ids_with_realname(&mut self, id_map: &BTreeMap<String, String>) {
        for (id, name) in id_map {
            let mention = format!("<@{id}>");
            if self.text.contains(&mention) {
                self.text = self.text.replace(&mention, &format!("@{name}:"));
            }
        }
    }

    /// Slack escapes angle brackets in exported message text.
    pub fn sub_html_entities(&mut self) {
        self.text = self.text.replace("&gt;", ">");
        self.text = self.text.replace("&lt;", "<");
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
