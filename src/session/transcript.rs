/// Prefix of every message line the shell itself writes.
pub const MESSAGE_PREFIX: &str = "|  ";

/// Accumulates the text returned for one request.
#[derive(Debug, Default)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Appends text exactly as given.
    pub fn raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Appends one unprefixed line.
    pub fn line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Appends a message, prefixing each of its lines.
    pub fn notice(&mut self, message: &str) {
        if message.is_empty() {
            self.text.push_str(MESSAGE_PREFIX);
            self.text.push('\n');
            return;
        }
        for line in message.lines() {
            self.text.push_str(MESSAGE_PREFIX);
            self.text.push_str(line);
            self.text.push('\n');
        }
    }

    /// A confirmation, shown only when the current mode asks for them.
    pub fn fluff(&mut self, enabled: bool, message: &str) {
        if enabled {
            self.notice(message);
        }
    }

    pub fn error(&mut self, message: &str) {
        self.notice(message);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the accumulated text and starts over.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}
