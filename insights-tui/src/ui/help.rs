//! Keyboard shortcut overlay.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::centered_rect;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(true))
        .title(" Keyboard Shortcuts ")
        .title_style(theme.accent_bold());

    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, theme, "Chart");
    key(&mut lines, theme, "h / l", "Select previous / next bar");
    key(&mut lines, theme, "Home / End", "First / last bar");
    key(&mut lines, theme, "t", "Show or hide the top table");
    lines.push(Line::from(""));

    section(&mut lines, theme, "Flows");
    key(&mut lines, theme, "j / k", "Scroll down / up");
    key(&mut lines, theme, "PgDn / PgUp", "Scroll by a page");
    lines.push(Line::from(""));

    section(&mut lines, theme, "Data");
    key(&mut lines, theme, "d", "Download top addresses as CSV");
    key(&mut lines, theme, "D", "Download full table as CSV");
    key(&mut lines, theme, "r", "Reload the balance table if it changed");
    key(&mut lines, theme, "R", "Force a reload from disk");
    lines.push(Line::from(""));

    key(&mut lines, theme, "?", "Toggle this help");
    key(&mut lines, theme, "q / Esc", "Quit");

    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, theme: &Theme, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme.accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, theme: &Theme, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>12}  ", keys), theme.accent_bold()),
        Span::styled(desc.to_string(), theme.muted_style()),
    ]));
}
