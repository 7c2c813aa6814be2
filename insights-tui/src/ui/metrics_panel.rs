//! Metric cards: total balance and tracked address count.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use insights_core::analytics::format_count;

use crate::app::AppState;
use crate::theme::Theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let symbol = &app.config.report.token_symbol;
    card(
        f,
        cards[0],
        &app.theme,
        &format!("Total {symbol} Balance"),
        &app.view.total_balance_display(),
    );
    card(
        f,
        cards[1],
        &app.theme,
        "Tracked Addresses",
        &format_count(app.view.metrics.distinct_addresses),
    );
}

fn card(f: &mut Frame, area: Rect, theme: &Theme, label: &str, value: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(false));
    let lines = vec![
        Line::from(Span::styled(label.to_string(), theme.muted_style())),
        Line::from(Span::styled(
            value.to_string(),
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}
