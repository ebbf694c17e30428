use afina_client::intake::parse_dropped_paths;
use afina_client::{Config, Notice, NoticeLevel, Session};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{prelude::*, widgets::*};
use std::io::Stdout;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use crate::keymap::{self, Hotkey};
use crate::screens;
use crate::theme;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Screen { Chat, Library }

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LibraryFocus { Databases, Files, Name }

impl LibraryFocus {
    fn next(self) -> Self {
        match self { LibraryFocus::Databases => LibraryFocus::Files, LibraryFocus::Files => LibraryFocus::Name, LibraryFocus::Name => LibraryFocus::Databases }
    }
    fn prev(self) -> Self {
        match self { LibraryFocus::Databases => LibraryFocus::Name, LibraryFocus::Files => LibraryFocus::Databases, LibraryFocus::Name => LibraryFocus::Files }
    }
}

pub struct Toast { pub msg: String, pub level: NoticeLevel, pub at: Instant }

const TOAST_TTL: Duration = Duration::from_millis(3500);

pub struct App {
    pub active: Screen,
    pub session: Session,
    pub focus: LibraryFocus,
    pub file_sel: usize,
    /// Open while the user types local paths to add.
    pub path_prompt: Option<String>,
    pub show_help: bool,
    pub status: String,
    pub toasts: Vec<Toast>,
}

impl App {
    pub fn new(session: Session) -> Self {
        let status = format!("afina v{}  •  {}", env!("CARGO_PKG_VERSION"), session.backend_url());
        Self {
            active: Screen::Chat,
            session,
            focus: LibraryFocus::Databases,
            file_sel: 0,
            path_prompt: None,
            show_help: false,
            status,
            toasts: vec![],
        }
    }

    fn push_toast(&mut self, n: Notice) {
        tracing::debug!(level = ?n.level, text = %n.text, "toast");
        self.toasts.push(Toast { msg: n.text, level: n.level, at: Instant::now() });
        if self.toasts.len() > 50 { self.toasts.drain(0..self.toasts.len() - 50); }
    }

    fn push_notices(&mut self, notices: Vec<Notice>) {
        for n in notices { self.push_toast(n); }
    }

    /// Fold everything the background tasks have produced since the last frame.
    pub fn drain_events(&mut self) {
        while let Some(ev) = self.session.try_next_event() {
            if let Some(n) = self.session.apply(ev) { self.push_toast(n); }
        }
        let files = self.session.intake.len();
        if self.file_sel >= files { self.file_sel = files.saturating_sub(1); }
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, k: KeyEvent) -> bool {
        let typed = !k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        if self.path_prompt.is_some() {
            self.handle_prompt_key(k, typed);
            return false;
        }

        if self.session.settings_panel().is_some_and(|p| p.is_open()) {
            return self.handle_settings_key(k, typed);
        }

        let hotkey = keymap::resolve(k);
        if hotkey != Hotkey::None {
            match hotkey {
                Hotkey::None => {}
                Hotkey::Quit => return true,
                Hotkey::SwitchTab(i) => self.active = if i == 0 { Screen::Chat } else { Screen::Library },
                Hotkey::ToggleHelp => self.show_help = !self.show_help,
                Hotkey::ToggleSettings => self.session.toggle_settings(),
                Hotkey::Refresh => {
                    self.session.refresh_databases();
                    self.status = "Refreshing databases…".into();
                }
                Hotkey::Upload => { self.session.upload(); }
                Hotkey::OpenPathPrompt => self.path_prompt = Some(String::new()),
                Hotkey::ToggleGenerator => self.session.uploader.toggle_generator(),
                Hotkey::ServerDefaults => self.session.pull_server_parameters(),
                Hotkey::ToggleTheme => theme::toggle_mode(),
            }
            return false;
        }

        match self.active {
            Screen::Chat => self.handle_chat_key(k, typed),
            Screen::Library => self.handle_library_key(k, typed),
        }
        false
    }

    fn handle_settings_key(&mut self, k: KeyEvent, typed: bool) -> bool {
        match keymap::resolve(k) {
            Hotkey::Quit => return true,
            Hotkey::ToggleSettings => { self.session.toggle_settings(); return false; }
            Hotkey::ServerDefaults => { self.session.pull_server_parameters(); return false; }
            _ => {}
        }
        match k.code {
            KeyCode::Esc => self.session.toggle_settings(),
            KeyCode::Enter => match self.session.save_settings() {
                Ok(()) => self.push_toast(Notice::success("Settings saved")),
                Err(e) => {
                    tracing::error!(error = %e, "saving settings failed");
                    self.push_toast(Notice::error(format!("Saving settings failed: {e}")));
                }
            },
            _ => {
                let Some(panel) = self.session.settings_panel_mut() else { return false };
                match k.code {
                    KeyCode::Tab | KeyCode::Down => panel.focus_next(),
                    KeyCode::BackTab | KeyCode::Up => panel.focus_prev(),
                    KeyCode::Backspace => panel.backspace(),
                    KeyCode::Char(c) if typed => panel.type_char(c),
                    _ => {}
                }
            }
        }
        false
    }

    fn handle_prompt_key(&mut self, k: KeyEvent, typed: bool) {
        match k.code {
            KeyCode::Esc => self.path_prompt = None,
            KeyCode::Enter => {
                let text = self.path_prompt.take().unwrap_or_default();
                let notices = self.session.add_paths(&parse_dropped_paths(&text));
                self.push_notices(notices);
            }
            KeyCode::Backspace => { if let Some(p) = self.path_prompt.as_mut() { p.pop(); } }
            KeyCode::Char(c) if typed => { if let Some(p) = self.path_prompt.as_mut() { p.push(c); } }
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, k: KeyEvent, typed: bool) {
        match k.code {
            KeyCode::Enter => { self.session.submit_message(); }
            KeyCode::PageUp => self.session.transcript.scroll_up(5),
            KeyCode::PageDown => self.session.transcript.scroll_down(5),
            KeyCode::Backspace => self.session.composer.backspace(),
            KeyCode::Delete => self.session.composer.delete(),
            KeyCode::Left => self.session.composer.left(),
            KeyCode::Right => self.session.composer.right(),
            KeyCode::Home => self.session.composer.home(),
            KeyCode::End => self.session.composer.end(),
            KeyCode::Char(c) if typed => self.session.composer.insert_char(c),
            _ => {}
        }
    }

    fn handle_library_key(&mut self, k: KeyEvent, typed: bool) {
        match k.code {
            KeyCode::Tab => { self.focus = self.focus.next(); return; }
            KeyCode::BackTab => { self.focus = self.focus.prev(); return; }
            _ => {}
        }
        match self.focus {
            LibraryFocus::Databases => match k.code {
                KeyCode::Up => self.session.selector.move_up(),
                KeyCode::Down => self.session.selector.move_down(),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    if let Some(id) = self.session.selector.current().map(|e| e.id) {
                        self.session.toggle_database(id);
                    }
                }
                _ => {}
            },
            LibraryFocus::Files => match k.code {
                KeyCode::Up => self.file_sel = self.file_sel.saturating_sub(1),
                KeyCode::Down => {
                    if self.file_sel + 1 < self.session.intake.len() { self.file_sel += 1; }
                }
                KeyCode::Delete | KeyCode::Backspace => {
                    self.session.remove_file(self.file_sel);
                    self.file_sel = self.file_sel.min(self.session.intake.len().saturating_sub(1));
                }
                _ => {}
            },
            LibraryFocus::Name => match k.code {
                KeyCode::Backspace => self.session.uploader.backspace(),
                KeyCode::Enter => { self.session.upload(); }
                KeyCode::Char(c) if typed => self.session.uploader.type_char(c),
                _ => {}
            },
        }
    }

    /// Bracketed paste. On the library screen a paste is a file drop.
    pub fn handle_paste(&mut self, text: &str) {
        if let Some(prompt) = self.path_prompt.as_mut() {
            prompt.push_str(text.trim_end_matches(['\r', '\n']));
            return;
        }
        if self.session.settings_panel().is_some_and(|p| p.is_open()) { return; }
        match self.active {
            Screen::Chat => self.session.composer.insert_str(text),
            Screen::Library => {
                let notices = self.session.add_dropped(text);
                self.push_notices(notices);
            }
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let (cfg, cfg_path) = Config::load()?;
    afina_telemetry::init(&cfg.log_path())?;
    tracing::info!(config = %cfg_path.display(), backend = %cfg.base_url(), "afina starting");

    let mut session = Session::open(&cfg)?;
    session.start();
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = event_loop(&mut terminal, &mut app);

    app.session.teardown();
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    tracing::info!("afina exiting");
    res
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.drain_events();
        terminal.draw(|f| ui(f, app))?;
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    if app.handle_key(k) { return Ok(()); }
                }
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let size = f.size();
    f.render_widget(Block::default().style(theme::body()), size);
    let input_h = if app.active == Screen::Chat { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),       // header
            Constraint::Min(1),          // body
            Constraint::Length(input_h), // composer (chat only)
            Constraint::Length(1),       // footer
        ])
        .split(size);

    let header_block = Block::default()
        .borders(Borders::ALL)
        .title(" Afina ")
        .border_style(theme::border())
        .border_type(BorderType::Rounded);
    let header_inner = header_block.inner(chunks[0]);
    f.render_widget(header_block, chunks[0]);
    let titles = ["Chat", "Library"].iter().enumerate().map(|(i, t)| {
        let style = if app.active as usize == i { theme::tab_active() } else { theme::tab_inactive() };
        Line::from(Span::styled(format!(" {} {} ", i + 1, t), style))
    });
    f.render_widget(Tabs::new(titles).select(app.active as usize).highlight_style(theme::tab_active()), header_inner);

    match app.active {
        Screen::Chat => screens::chat::draw(f, chunks[1], app),
        Screen::Library => screens::library::draw(f, chunks[1], app),
    }

    if app.active == Screen::Chat {
        let composer = &app.session.composer;
        let inner_w = chunks[2].width.saturating_sub(2);
        let col = composer.cursor_column();
        // keep the caret visible on long lines
        let skip = col.saturating_sub(inner_w.saturating_sub(1));
        let mut title = String::from("Message");
        if composer.pending() > 0 { title.push_str(&format!(" ({} waiting)", composer.pending())); }
        let input = Paragraph::new(composer.input())
            .scroll((0, skip))
            .block(Block::default().borders(Borders::ALL).title(title).border_style(theme::border()));
        f.render_widget(input, chunks[2]);
        let no_overlay = app.path_prompt.is_none() && !app.session.settings_panel().is_some_and(|p| p.is_open());
        if no_overlay {
            f.set_cursor(chunks[2].x + 1 + col - skip, chunks[2].y + 1);
        }
    }

    let hints = match app.active {
        Screen::Chat => "Enter send • PgUp/PgDn scroll • F2 library • Ctrl-S settings • Ctrl-H help • Ctrl-Q quit",
        Screen::Library => "Tab focus • Space check • Del remove • Ctrl-O add files • Ctrl-G generator • Ctrl-U upload • Ctrl-R refresh",
    };
    f.render_widget(Paragraph::new(format!("{}  |  {}", app.status, hints)).style(theme::status()), chunks[3]);

    draw_toasts(f, app);
    if app.session.settings_panel().is_some_and(|p| p.is_open()) {
        screens::settings::draw(f, app);
    }
    if let Some(prompt) = &app.path_prompt {
        draw_path_prompt(f, prompt);
    }
    if app.show_help {
        draw_help(f);
    }
}

fn draw_toasts(f: &mut Frame, app: &App) {
    let size = f.size();
    let now = Instant::now();
    let live: Vec<&Toast> = app.toasts.iter().filter(|t| now.duration_since(t.at) < TOAST_TTL).collect();
    if live.is_empty() { return; }
    let shown = &live[live.len().saturating_sub(3)..];
    let width = 56u16.min(size.width);
    let height = shown.len() as u16 + 2;
    let area = Rect {
        x: size.x + size.width.saturating_sub(width + 2),
        y: size.y + size.height.saturating_sub(height + 2),
        width,
        height,
    };
    let lines: Vec<Line> = shown.iter().map(|t| Line::from(t.msg.as_str()).style(theme::notice(t.level))).collect();
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Notifications").border_type(BorderType::Rounded).border_style(theme::border()).style(theme::panel());
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn draw_path_prompt(f: &mut Frame, prompt: &str) {
    let area = centered_rect(70, 20, f.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Add files (paths separated by spaces, quote names with spaces; Enter add, Esc cancel)")
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::panel());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(prompt).block(block).wrap(Wrap { trim: false }), area);
    let w = u16::try_from(prompt.width()).unwrap_or(u16::MAX);
    if area.width > 2 && w < area.width - 2 {
        f.set_cursor(area.x + 1 + w, area.y + 1);
    }
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(70, 70, f.size());
    let mut lines: Vec<Line> = [
        "Navigation: F1/Alt-1 chat, F2/Alt-2 library",
        "Chat: Enter send, PgUp/PgDn scroll",
        "Library: Tab cycle panes, Space toggle database, Del remove file",
        "Files: paste or drop paths onto the library, or Ctrl-O to type them",
        "Upload: type a collection name, Ctrl-G chunk/paragraphs, Ctrl-U upload",
        "Refresh databases: Ctrl-R (also every 30s)",
        "Settings: Ctrl-S open/close, Enter save, Ctrl-D server defaults",
        "Theme: Ctrl-T  •  Quit: Ctrl-Q  •  Help: Ctrl-H",
        "",
        "Requests this session:",
    ]
    .iter()
    .map(|s| Line::from(*s))
    .collect();
    let summary = afina_telemetry::summarize();
    if summary.is_empty() {
        lines.push(Line::from("  (none yet)").style(theme::status()));
    }
    lines.extend(summary.into_iter().map(|s| Line::from(format!("  {s}"))));
    lines.push(Line::from(format!("Theme: {}", theme::mode_name())).style(theme::status()));
    let block = Block::default().borders(Borders::ALL).title("Help").border_type(BorderType::Rounded).border_style(theme::border()).style(theme::panel());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub(crate) fn centered_rect(pct_x: u16, pct_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default().direction(Direction::Vertical).constraints([
        Constraint::Percentage((100 - pct_y) / 2), Constraint::Percentage(pct_y), Constraint::Percentage((100 - pct_y) / 2),]).split(r);
    Layout::default().direction(Direction::Horizontal).constraints([
        Constraint::Percentage((100 - pct_x) / 2), Constraint::Percentage(pct_x), Constraint::Percentage((100 - pct_x) / 2),]).split(popup_layout[1])[1]
}
