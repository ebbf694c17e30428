use unicode_width::UnicodeWidthStr;

/// Single-line message input plus the count of replies still in flight.
#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    /// Byte offset of the caret within `input`.
    cursor: usize,
    pending: usize,
}

impl Composer {
    pub fn new() -> Self { Self::default() }

    pub fn input(&self) -> &str { &self.input }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.cursor = self.input.len();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    /// Trimmed message, or `None` when there is nothing to send.
    pub fn message(&self) -> Option<&str> {
        let m = self.input.trim();
        (!m.is_empty()).then_some(m)
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        let s = s.replace(['\r', '\n'], " ");
        self.input.insert_str(self.cursor, &s);
        self.cursor += s.len();
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.input[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.input.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(c) = self.input[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.input[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn home(&mut self) { self.cursor = 0; }

    pub fn end(&mut self) { self.cursor = self.input.len(); }

    /// Display column of the caret.
    pub fn cursor_column(&self) -> u16 {
        u16::try_from(self.input[..self.cursor].width()).unwrap_or(u16::MAX)
    }

    pub fn pending(&self) -> usize { self.pending }

    pub(crate) fn begin_request(&mut self) { self.pending += 1; }

    pub(crate) fn end_request(&mut self) { self.pending = self.pending.saturating_sub(1); }
}
