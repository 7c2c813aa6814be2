//! Expandable top-N table (`t`).

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use insights_core::analytics::format_number;

use crate::app::AppState;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(false))
        .title(format!(" Top {} Table [t] hide ", app.view.top_n))
        .title_style(theme.accent_bold());

    let header = Row::new(["#", "address", "balance"].map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    }));

    // Keep the selected bar visible when the list is longer than the panel.
    let visible = area.height.saturating_sub(3) as usize;
    let skip = app.selected_bar.saturating_sub(visible.saturating_sub(1));

    let rows = app.view.bars.iter().skip(skip).map(|bar| {
        let style = if bar.rank == app.selected_bar {
            theme.accent_bold()
        } else {
            theme.text_style()
        };
        Row::new(vec![
            Cell::from(format!("{}", bar.rank + 1)),
            Cell::from(bar.address.clone()),
            Cell::from(format_number(bar.balance, 2)),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(4),
        Constraint::Length(44),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}
