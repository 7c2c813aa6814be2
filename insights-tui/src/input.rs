//! Keyboard input dispatch: overlay first, then page keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Download, Overlay};

const PAGE: isize = 10;

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    if app.overlay == Overlay::Help {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter => app.overlay = Overlay::None,
            KeyCode::Char('q') => app.running = false,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
        KeyCode::Char('?') => app.toggle_help(),

        // Bar cursor
        KeyCode::Char('l') | KeyCode::Right => app.select_next_bar(),
        KeyCode::Char('h') | KeyCode::Left => app.select_prev_bar(),
        KeyCode::Home => app.select_first_bar(),
        KeyCode::End => app.select_last_bar(),

        // Flow table
        KeyCode::Char('j') | KeyCode::Down => app.scroll_flows(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_flows(-1),
        KeyCode::PageDown => app.scroll_flows(PAGE),
        KeyCode::PageUp => app.scroll_flows(-PAGE),

        KeyCode::Char('t') => app.toggle_top_table(),
        KeyCode::Char('d') => app.download(Download::TopN),
        KeyCode::Char('D') => app.download(Download::FullTable),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => app.force_reload(),
        _ => {}
    }
}
