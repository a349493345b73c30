//! The console scrollback.

/// Text shown in the operator console.
///
/// Starts out as a single prompt. Every mutation returns the text it
/// appended so callers can forward it to a renderer.
#[derive(Debug, Clone)]
pub struct Scrollback {
    text: String,
    prompt: String,
}

impl Scrollback {
    pub fn new(prompt: &str) -> Self {
        Self {
            text: format!("{prompt} "),
            prompt: prompt.to_string(),
        }
    }

    /// Echo a dispatched command after the current prompt.
    pub fn echo(&mut self, command: &str) -> String {
        self.append(&format!("{command}\n"))
    }

    pub fn append(&mut self, chunk: &str) -> String {
        self.text.push_str(chunk);
        chunk.to_string()
    }

    /// Append a fresh prompt on its own line.
    pub fn rearm(&mut self) -> String {
        let mut added = String::new();
        if !self.text.ends_with('\n') {
            added.push('\n');
        }
        added.push_str(&self.prompt);
        added.push(' ');
        self.append(&added)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
