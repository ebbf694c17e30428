use afina_client::uploader::UploadState;
use ratatui::{prelude::*, widgets::*};

use crate::app::{App, LibraryFocus};
use crate::theme;

fn pane(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if focused { theme::border() } else { theme::border_idle() })
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.session;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3), Constraint::Length(7)])
        .split(cols[1]);

    // Databases
    let focused = app.focus == LibraryFocus::Databases;
    let title = match s.selector.refreshed_at() {
        Some(at) => format!("Databases (updated {})", at.format("%H:%M:%S")),
        None => "Databases (loading…)".to_string(),
    };
    let items: Vec<ListItem> = if s.selector.listing().is_empty() {
        vec![ListItem::new("(no databases)").style(theme::status())]
    } else {
        s.selector
            .rows()
            .enumerate()
            .map(|(i, (entry, checked))| {
                let label = format!("[{}] {}", if checked { "x" } else { " " }, entry.filename);
                let style = if focused && i == s.selector.cursor() { theme::selected() } else { Style::default().fg(theme::fg()) };
                ListItem::new(label).style(style)
            })
            .collect()
    };
    f.render_widget(List::new(items).block(pane(title, focused)), cols[0]);

    // Pending files
    let focused = app.focus == LibraryFocus::Files;
    let items: Vec<ListItem> = if s.intake.is_empty() {
        vec![ListItem::new("(paste or drop .txt paths here, or Ctrl-O)").style(theme::status())]
    } else {
        s.intake
            .files()
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let style = if focused && i == app.file_sel { theme::selected() } else { Style::default().fg(theme::fg()) };
                ListItem::new(format!("{}  ({} bytes)", file.name, file.content.len())).style(style)
            })
            .collect()
    };
    f.render_widget(List::new(items).block(pane(format!("Files to upload ({})", s.intake.len()), focused)), right[0]);

    // Collection name
    let focused = app.focus == LibraryFocus::Name;
    let ready = if s.upload_enabled() { "Ctrl-U upload" } else { "needs files and a name" };
    let title = format!("Collection name • {} • {}", s.uploader.generator().as_str(), ready);
    f.render_widget(Paragraph::new(s.uploader.collection_name()).block(pane(title, focused)), right[1]);
    if focused && app.path_prompt.is_none() {
        let w = u16::try_from(unicode_width::UnicodeWidthStr::width(s.uploader.collection_name())).unwrap_or(u16::MAX);
        if w.saturating_add(2) < right[1].width {
            f.set_cursor(right[1].x + 1 + w, right[1].y + 1);
        }
    }

    // Upload status, one line per collection
    let lines: Vec<Line> = s
        .uploader
        .lines()
        .iter()
        .map(|l| {
            let style = match l.state {
                UploadState::InProgress => theme::status(),
                UploadState::Succeeded(_) => Style::default().fg(Color::Green),
                UploadState::Failed(_) => Style::default().fg(Color::Red),
            };
            Line::from(vec![Span::raw(format!("{}  ", l.label())), Span::styled(l.state.text().to_string(), style)])
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(pane("Uploads".to_string(), false)).wrap(Wrap { trim: true }), right[2]);
}
