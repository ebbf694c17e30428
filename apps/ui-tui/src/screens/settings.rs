use afina_client::settings::SettingsField;
use ratatui::{prelude::*, widgets::*};

use crate::app::{centered_rect, App};
use crate::theme;

/// Floating generation-settings panel.
pub fn draw(f: &mut Frame, app: &App) {
    let Some(panel) = app.session.settings_panel() else { return };
    let area = centered_rect(60, 50, f.size());
    let mut lines: Vec<Line> = vec![Line::from("Generation parameters").style(theme::tab_active()), Line::from("")];
    for field in SettingsField::ALL {
        let focused = panel.focused() == field;
        let marker = if focused { "›" } else { " " };
        let value_style = if focused { theme::selected() } else { Style::default().fg(theme::fg()) };
        lines.push(Line::from(vec![
            Span::raw(format!("{marker} {:<26}", field.label())),
            Span::styled(format!(" {:<10}", panel.field(field)), value_style),
            Span::styled(format!("  {}", field.hint()), theme::status()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Enter save • Esc close • ↑/↓ move • Ctrl-D server defaults").style(theme::status()));
    lines.push(Line::from(format!("Stored in {}", app.session.storage_path().display())).style(theme::status()));
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Settings")
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::panel());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}
