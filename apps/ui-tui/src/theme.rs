use afina_client::NoticeLevel;
use ratatui::style::{Color, Modifier, Style};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Mode { Night = 0, Plain = 1 }

static MODE: AtomicU8 = AtomicU8::new(Mode::Night as u8);

fn mode() -> Mode { if MODE.load(Ordering::Relaxed) == Mode::Night as u8 { Mode::Night } else { Mode::Plain } }

pub fn toggle_mode() {
    let next = if mode() == Mode::Night { Mode::Plain } else { Mode::Night };
    MODE.store(next as u8, Ordering::Relaxed);
}

pub fn mode_name() -> &'static str { match mode() { Mode::Night => "night", Mode::Plain => "plain" } }

// Palette
pub fn bg() -> Color { match mode() { Mode::Night => Color::Rgb(14, 16, 24), Mode::Plain => Color::Reset } }
pub fn fg() -> Color { match mode() { Mode::Night => Color::Rgb(225, 228, 235), Mode::Plain => Color::White } }
pub fn accent() -> Color { match mode() { Mode::Night => Color::Rgb(120, 170, 255), Mode::Plain => Color::Cyan } }
pub fn muted() -> Color { match mode() { Mode::Night => Color::Rgb(130, 136, 150), Mode::Plain => Color::Gray } }
pub fn panel_bg() -> Color { match mode() { Mode::Night => Color::Rgb(26, 29, 40), Mode::Plain => Color::Rgb(30, 30, 30) } }

pub fn body() -> Style { Style::default().bg(bg()).fg(fg()) }
pub fn panel() -> Style { Style::default().bg(panel_bg()).fg(fg()) }
pub fn border() -> Style { Style::default().fg(accent()) }
pub fn border_idle() -> Style { Style::default().fg(muted()) }
pub fn tab_active() -> Style { Style::default().fg(accent()).add_modifier(Modifier::BOLD) }
pub fn tab_inactive() -> Style { Style::default().fg(muted()) }
pub fn status() -> Style { Style::default().fg(muted()) }
pub fn selected() -> Style { Style::default().fg(accent()).add_modifier(Modifier::REVERSED) }

pub fn user_label() -> Style { Style::default().fg(Color::Green).add_modifier(Modifier::BOLD) }
pub fn ai_label() -> Style { Style::default().fg(accent()).add_modifier(Modifier::BOLD) }
pub fn typing() -> Style { Style::default().fg(muted()).add_modifier(Modifier::ITALIC) }

pub fn notice(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(Color::Cyan),
        NoticeLevel::Success => Style::default().fg(Color::Green),
        NoticeLevel::Warn => Style::default().fg(Color::Yellow),
        NoticeLevel::Error => Style::default().fg(Color::Red),
    }
}
