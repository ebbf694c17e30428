use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// Global hotkeys. Only Ctrl/Alt combos and function keys, so plain typing is never stolen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    None,
    Quit,
    SwitchTab(usize), // 0-based index
    ToggleHelp,
    ToggleSettings,
    Refresh,
    Upload,
    OpenPathPrompt,
    ToggleGenerator,
    ServerDefaults,
    ToggleTheme,
}

pub fn resolve(ev: KeyEvent) -> Hotkey {
    match (ev.modifiers, ev.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::CONTROL, KeyCode::Char('q')) => Hotkey::Quit,
        (KeyModifiers::NONE, KeyCode::F(1)) | (KeyModifiers::ALT, KeyCode::Char('1')) => Hotkey::SwitchTab(0),
        (KeyModifiers::NONE, KeyCode::F(2)) | (KeyModifiers::ALT, KeyCode::Char('2')) => Hotkey::SwitchTab(1),
        (KeyModifiers::CONTROL, KeyCode::Char('h')) => Hotkey::ToggleHelp,
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => Hotkey::ToggleSettings,
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => Hotkey::Refresh,
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => Hotkey::Upload,
        (KeyModifiers::CONTROL, KeyCode::Char('o')) => Hotkey::OpenPathPrompt,
        (KeyModifiers::CONTROL, KeyCode::Char('g')) => Hotkey::ToggleGenerator,
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => Hotkey::ServerDefaults,
        (KeyModifiers::CONTROL, KeyCode::Char('t')) => Hotkey::ToggleTheme,
        _ => Hotkey::None,
    }
}
