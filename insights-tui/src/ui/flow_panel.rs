//! Token inflow/outflow table, ordered by balance change.
//!
//! The `balance_changed` column carries the red-yellow-green gradient computed
//! by the report view. Rows with no change value are drawn without a fill.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use insights_core::analytics::format_number;
use insights_core::report::FlowRow;

use crate::app::AppState;
use crate::theme::{rgb, Theme};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let flows = &app.view.flows;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(false))
        .title(format!(
            " Token Inflows and Outflows ({}/{}) [j/k] scroll ",
            (app.flow_scroll + 1).min(flows.len()),
            flows.len()
        ))
        .title_style(
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        );

    if flows.is_empty() {
        let text = Paragraph::new(Line::from(Span::styled(
            "No flow data.",
            theme.muted_style(),
        )))
        .block(block);
        f.render_widget(text, area);
        return;
    }

    let header = Row::new(
        ["address", "tokens_in", "tokens_out", "balance_changed"].map(|h| {
            Cell::from(h).style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        }),
    );

    let rows = flows
        .iter()
        .skip(app.flow_scroll)
        .map(|row| flow_row(row, theme));

    let widths = [
        Constraint::Length(44),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(18),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}

fn flow_row<'a>(row: &FlowRow, theme: &Theme) -> Row<'a> {
    let change = Cell::from(cell_text(row.balance_changed));
    let change = match row.change_colors {
        Some(colors) => change.style(
            Style::default()
                .bg(rgb(colors.background))
                .fg(rgb(colors.foreground)),
        ),
        None => match row.balance_changed {
            Some(v) => change.style(Style::default().fg(theme.signed_color(v))),
            None => change,
        },
    };

    Row::new(vec![
        Cell::from(row.address.clone()).style(theme.text_style()),
        Cell::from(cell_text(row.tokens_in)).style(theme.text_style()),
        Cell::from(cell_text(row.tokens_out)).style(theme.text_style()),
        change,
    ])
}

/// Missing values render as an empty cell.
fn cell_text(value: Option<f64>) -> String {
    value.map(|v| format_number(v, 2)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_are_blank() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(-1234.5)), "-1,234.50");
    }
}
