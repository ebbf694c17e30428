use crate::typing::next_boundary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender { User, Ai }

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Shown verbatim, never interpreted as markup.
    Plain(String),
    /// `revealed` is a byte offset into `html`; `None` while the typing indicator shows.
    Html { html: String, revealed: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub sender: Sender,
    pub body: Body,
}

impl Entry {
    /// The part of an AI reply currently on screen.
    pub fn visible_html(&self) -> Option<&str> {
        match &self.body {
            Body::Html { html, revealed: Some(n) } => Some(&html[..(*n).min(html.len())]),
            _ => None,
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.body, Body::Html { revealed: None, .. })
    }
}

/// Append-only conversation log with a bottom-anchored scroll offset.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
    scroll_from_bottom: u16,
}

impl Transcript {
    pub fn new() -> Self { Self::default() }

    pub fn entries(&self) -> &[Entry] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn push(&mut self, sender: Sender, body: Body) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, sender, body });
        self.scroll_to_bottom();
        id
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        self.push(Sender::User, Body::Plain(text.into()))
    }

    /// Appended with the typing indicator showing.
    pub fn push_ai(&mut self, html: impl Into<String>) -> EntryId {
        self.push(Sender::Ai, Body::Html { html: html.into(), revealed: None })
    }

    /// Move an AI entry's cursor forward. Offsets that would split a tag or
    /// a character are snapped to the next boundary; the cursor never goes back.
    pub fn advance(&mut self, id: EntryId, revealed: usize) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else { return false };
        let Body::Html { html, revealed: cursor } = &mut entry.body else { return false };
        let mut target = 0;
        while target < revealed.min(html.len()) {
            target = next_boundary(html, target);
        }
        if cursor.map_or(true, |c| target > c) {
            *cursor = Some(target);
        }
        self.scroll_to_bottom();
        true
    }

    pub fn scroll_offset(&self) -> u16 { self.scroll_from_bottom }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) { self.scroll_from_bottom = 0; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_stays_plain() {
        let mut t = Transcript::new();
        let id = t.push_user("<script>alert(1)</script>");
        let e = t.get(id).unwrap();
        assert_eq!(e.sender, Sender::User);
        assert_eq!(e.body, Body::Plain("<script>alert(1)</script>".into()));
        assert!(e.visible_html().is_none());
    }

    #[test]
    fn ai_entry_starts_typing_then_reveals() {
        let mut t = Transcript::new();
        let id = t.push_ai("<b>Hi</b>");
        assert!(t.get(id).unwrap().is_typing());
        assert!(t.advance(id, 3));
        assert_eq!(t.get(id).unwrap().visible_html(), Some("<b>"));
        // mid-tag offset snaps forward
        t.advance(id, 6);
        assert_eq!(t.get(id).unwrap().visible_html(), Some("<b>Hi</b>"));
        t.advance(id, 1);
        assert_eq!(t.get(id).unwrap().visible_html(), Some("<b>Hi</b>"));
    }

    #[test]
    fn reveal_pins_scroll_to_bottom() {
        let mut t = Transcript::new();
        let id = t.push_ai("abc");
        t.scroll_up(10);
        assert_eq!(t.scroll_offset(), 10);
        t.advance(id, 1);
        assert_eq!(t.scroll_offset(), 0);
    }

    #[test]
    fn advance_ignores_plain_and_unknown_entries() {
        let mut t = Transcript::new();
        let u = t.push_user("hi");
        assert!(!t.advance(u, 1));
        assert!(!t.advance(EntryId(42), 1));
    }
}
