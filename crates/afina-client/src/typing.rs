//! Tag-aware progressive reveal of an already complete HTML reply.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::session::SessionEvent;
use crate::transcript::EntryId;

pub const TYPING_INDICATOR: &str = "Afina is typing...";

/// Byte offset of the next visible boundary after `revealed`.
///
/// One step is one character, except that a `<` swallows everything up to and
/// including the next `>`. A `<` with no closing `>` counts as one character.
/// An offset inside a multibyte character snaps forward to that character's end.
pub fn next_boundary(source: &str, revealed: usize) -> usize {
    if revealed >= source.len() {
        return source.len();
    }
    if !source.is_char_boundary(revealed) {
        return (revealed + 1..source.len()).find(|&i| source.is_char_boundary(i)).unwrap_or(source.len());
    }
    let rest = &source[revealed..];
    if rest.starts_with('<') {
        if let Some(close) = rest.find('>') {
            return revealed + close + 1;
        }
    }
    let step = rest.chars().next().map(char::len_utf8).unwrap_or(1);
    revealed + step
}

/// Every visible prefix of `source`, shortest first, ending with `source` itself.
pub struct Reveal<'a> {
    source: &'a str,
    revealed: usize,
}

impl<'a> Reveal<'a> {
    pub fn new(source: &'a str) -> Self { Self { source, revealed: 0 } }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.revealed >= self.source.len() {
            return None;
        }
        self.revealed = next_boundary(self.source, self.revealed);
        Some(&self.source[..self.revealed])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingTiming {
    /// How long the indicator shows before the first character.
    pub indicator_delay: Duration,
    pub tick: Duration,
}

impl Default for TypingTiming {
    fn default() -> Self {
        Self { indicator_delay: Duration::from_millis(500), tick: Duration::from_millis(10) }
    }
}

/// Run the reveal for `entry` on its own task. It runs to completion; there is no handle to stop it.
pub(crate) fn spawn_reveal(entry: EntryId, html: String, timing: TypingTiming, tx: UnboundedSender<SessionEvent>) {
    tokio::spawn(async move {
        tokio::time::sleep(timing.indicator_delay).await;
        let mut revealed = 0;
        while revealed < html.len() {
            revealed = next_boundary(&html, revealed);
            if tx.send(SessionEvent::TypingAdvanced { entry, revealed }).is_err() {
                tracing::debug!(entry = entry.0, "session gone; reveal abandoned");
                return;
            }
            if revealed < html.len() {
                tokio::time::sleep(timing.tick).await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_atomic() {
        let steps: Vec<&str> = Reveal::new("<b>Hi</b> there").collect();
        assert_eq!(steps[0], "<b>");
        assert_eq!(steps[1], "<b>H");
        assert_eq!(steps[2], "<b>Hi");
        assert_eq!(steps[3], "<b>Hi</b>");
        assert_eq!(*steps.last().unwrap(), "<b>Hi</b> there");
        for s in &steps {
            let open = s.rfind('<');
            let close = s.rfind('>');
            assert!(open.is_none() || close > open, "partial tag visible in {s:?}");
        }
    }

    #[test]
    fn unmatched_angle_is_literal() {
        let steps: Vec<&str> = Reveal::new("a < b").collect();
        assert_eq!(steps, vec!["a", "a ", "a <", "a < ", "a < b"]);
    }

    #[test]
    fn attributes_never_split() {
        let src = r#"<a href="x">go</a>"#;
        let steps: Vec<&str> = Reveal::new(src).collect();
        assert_eq!(steps.first().copied(), Some(r#"<a href="x">"#));
        assert_eq!(steps.len(), 4);
    }

    #[test]
    fn multibyte_characters_step_whole() {
        let steps: Vec<&str> = Reveal::new("héé").collect();
        assert_eq!(steps, vec!["h", "hé", "héé"]);
        assert_eq!(next_boundary("héé", 99), 5);
    }

    #[test]
    fn offset_inside_a_character_snaps_forward() {
        assert_eq!(next_boundary("héé", 2), 3);
        assert_eq!(next_boundary("héé", 4), 5);
        assert_eq!(next_boundary("日<b>", 1), 3);
    }

    #[test]
    fn empty_source_reveals_nothing() {
        assert_eq!(Reveal::new("").count(), 0);
        assert_eq!(next_boundary("", 0), 0);
    }

    #[tokio::test]
    async fn reveal_task_emits_every_boundary() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let timing = TypingTiming { indicator_delay: Duration::from_millis(1), tick: Duration::from_millis(1) };
        spawn_reveal(EntryId(7), "<i>ok</i>".to_string(), timing, tx);
        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            match ev {
                SessionEvent::TypingAdvanced { entry, revealed } => {
                    assert_eq!(entry, EntryId(7));
                    seen.push(revealed);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(seen, vec![3, 4, 5, 9]);
    }
}
