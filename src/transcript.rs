use crate::markdown;

pub const WELCOME_MARKUP: &str =
    "<p class=\"welcome\">Paste your data and ask a question to get started.</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub sender: Sender,
    pub message: String,
    #[allow(dead_code)]
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    // Appends the trimmed message; a message that trims to empty is a no-op.
    pub fn append(&mut self, sender: Sender, message: &str) -> bool {
        let message = message.trim();
        if message.is_empty() {
            return false;
        }
        self.entries.push(ChatEntry {
            sender,
            message: message.to_string(),
            index: self.entries.len(),
        });
        true
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read-only copy of the conversation so far, in append order.
    #[allow(dead_code)]
    pub fn snapshot(&self) -> Vec<(Sender, String)> {
        self.entries
            .iter()
            .map(|e| (e.sender, e.message.clone()))
            .collect()
    }

    // Full re-render on every call. Fine for interactive transcripts of tens
    // of turns; not meant to scale past that.
    pub fn render_all(&self) -> String {
        if self.entries.is_empty() {
            return WELCOME_MARKUP.to_string();
        }

        let mut out = String::new();
        for entry in &self.entries {
            match entry.sender {
                // User text is shown as typed, never run through the
                // markdown pass.
                Sender::User => {
                    out.push_str(&format!(
                        "<div class=\"user\"><b>You:</b> {}</div>\n",
                        entry.message
                    ));
                }
                Sender::Assistant => {
                    out.push_str(&format!(
                        "<div class=\"assistant\"><b>AI:</b>\n{}\n</div>\n",
                        markdown::format(&entry.message)
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_empty_is_noop() {
        let mut t = Transcript::new();
        assert!(!t.append(Sender::User, ""));
        assert!(!t.append(Sender::User, "   \n "));
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let mut t = Transcript::new();
        assert!(t.append(Sender::User, "hi"));
        assert!(t.append(Sender::Assistant, "hello"));
        assert_eq!(
            t.snapshot(),
            vec![
                (Sender::User, "hi".to_string()),
                (Sender::Assistant, "hello".to_string()),
            ]
        );
        assert_eq!(t.entries()[0].index, 0);
        assert_eq!(t.entries()[1].index, 1);
    }

    #[test]
    fn clear_resets_to_welcome() {
        let mut t = Transcript::new();
        t.append(Sender::User, "hi");
        t.append(Sender::Assistant, "hello");
        t.clear();
        assert!(t.snapshot().is_empty());
        assert_eq!(t.render_all(), WELCOME_MARKUP);
    }

    #[test]
    fn empty_transcript_renders_welcome() {
        assert_eq!(Transcript::new().render_all(), WELCOME_MARKUP);
    }

    #[test]
    fn user_text_is_not_markdown_formatted() {
        let mut t = Transcript::new();
        t.append(Sender::User, "# not a heading");
        let markup = t.render_all();
        assert!(markup.contains("<b>You:</b> # not a heading"));
        assert!(!markup.contains("<h1>"));
    }

    #[test]
    fn assistant_text_is_markdown_formatted() {
        let mut t = Transcript::new();
        t.append(Sender::Assistant, "### Summary\n- one\n- two");
        let markup = t.render_all();
        assert!(markup.contains("<h3>Summary</h3>"));
        assert!(markup.contains("<li>one</li>"));
        assert!(markup.contains("<li>two</li>"));
    }

    #[test]
    fn render_is_deterministic() {
        let mut t = Transcript::new();
        t.append(Sender::User, "hi");
        t.append(Sender::Assistant, "**hello**");
        assert_eq!(t.render_all(), t.render_all());
    }
}
