use afina_client::transcript::{Body, Sender, Transcript};
use afina_client::typing::TYPING_INDICATOR;
use ratatui::{prelude::*, widgets::*};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::theme;

/// Plain-text rendering of revealed reply markup.
pub(crate) fn render_html(html: &str, width: usize) -> String {
    html2text::from_read(html.as_bytes(), width.max(10))
}

/// Greedy word wrap to display columns. Words wider than a row are split.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.lines() {
        let mut row = String::new();
        let mut used = 0;
        for word in line.split_inclusive(' ') {
            let w = word.width();
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            if w <= width {
                row.push_str(word);
                used += w;
                continue;
            }
            for c in word.chars() {
                let cw = c.width().unwrap_or(0);
                if used + cw > width && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                row.push(c);
                used += cw;
            }
        }
        rows.push(row);
    }
    rows
}

/// One `Line` per screen row, already wrapped to `width` body columns.
pub(crate) fn transcript_lines(t: &Transcript, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let indent = |rows: Vec<String>| rows.into_iter().map(|l| Line::from(format!("  {l}")));
    for e in t.entries() {
        match e.sender {
            Sender::User => lines.push(Line::from("You:").style(theme::user_label())),
            Sender::Ai => lines.push(Line::from("Afina:").style(theme::ai_label())),
        }
        match &e.body {
            // user text is never interpreted
            Body::Plain(text) => lines.extend(indent(wrap_text(text, width))),
            Body::Html { .. } if e.is_typing() => lines.push(Line::from(format!("  {TYPING_INDICATOR}")).style(theme::typing())),
            Body::Html { .. } => {
                let shown = render_html(e.visible_html().unwrap_or_default(), width);
                lines.extend(indent(wrap_text(&shown, width)));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
    draw_transcript(f, area, &app.session.transcript);
}

pub(crate) fn draw_transcript(f: &mut Frame, area: Rect, transcript: &Transcript) {
    let lines = if transcript.is_empty() {
        vec![Line::from("(Type a message and press Enter)").style(theme::status())]
    } else {
        transcript_lines(transcript, area.width.saturating_sub(4) as usize)
    };
    let block = Block::default().borders(Borders::ALL).title("Chat").border_style(theme::border());
    // Rows are pre-wrapped, so counting lines counts screen rows
    let max_visible = area.height.saturating_sub(2) as usize;
    let total = lines.len();
    let offset = (transcript.scroll_offset() as usize).min(total.saturating_sub(max_visible));
    let start = total.saturating_sub(max_visible + offset);
    let p = Paragraph::new(lines.into_iter().skip(start).take(max_visible).collect::<Vec<_>>()).block(block);
    f.render_widget(p, area);
}
