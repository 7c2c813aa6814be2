//! Top-N bar chart with a movable cursor and its detail line.
//!
//! Each bar takes its color from the report palette by rank. The detail line
//! under the chart stands in for hover: full address and exact balance of the
//! selected bar.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme::rgb;

const BAR_GAP: u16 = 1;
/// Wide enough for a shortened address (`0x765d...282a`).
const MAX_BAR_WIDTH: u16 = 13;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let view = &app.view;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(true))
        .title(format!(
            " Top {} Addresses by {} Balance [h/l] select ",
            view.top_n, app.config.report.token_symbol
        ))
        .title_style(
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        );

    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.bars.is_empty() {
        let text = Paragraph::new(Span::styled("No balances to chart.", theme.muted_style()));
        f.render_widget(text, inner);
        return;
    }

    let bars: Vec<Bar> = view
        .bars
        .iter()
        .map(|bar| {
            let color = rgb(bar.color);
            let selected = bar.rank == app.selected_bar;
            let label_style = if selected {
                theme.accent_bold().add_modifier(Modifier::REVERSED)
            } else {
                theme.muted_style()
            };
            let bar_style = if selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            Bar::default()
                .value(bar_value(bar.balance))
                .text_value(bar.label.clone())
                .label(Line::styled(bar.short_address.clone(), label_style))
                .style(bar_style)
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(inner.width, view.bars.len()))
        .bar_gap(BAR_GAP)
        .max(bar_value(view.max_bar_balance()).max(1));

    f.render_widget(chart, inner);
}

/// Detail line for the selected bar.
pub fn render_detail(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let line = match app.selected() {
        Some(bar) => Line::from(vec![
            Span::styled(format!(" ▶ #{} ", bar.rank + 1), theme.accent_bold()),
            Span::styled(bar.detail(), theme.text_style()),
        ]),
        None => Line::from(Span::styled(" No bar selected", theme.muted_style())),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Bars are drawn from zero; negative balances render as empty bars.
fn bar_value(balance: f64) -> u64 {
    if balance.is_finite() && balance > 0.0 {
        balance.round() as u64
    } else {
        0
    }
}

fn bar_width(available: u16, bars: usize) -> u16 {
    let n = bars.max(1);
    let gaps = usize::from(BAR_GAP).saturating_mul(n - 1);
    let width = usize::from(available).saturating_sub(gaps) / n;
    u16::try_from(width)
        .unwrap_or(u16::MAX)
        .clamp(1, MAX_BAR_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_values_clamp_at_zero() {
        assert_eq!(bar_value(1234.6), 1235);
        assert_eq!(bar_value(-5.0), 0);
        assert_eq!(bar_value(f64::NAN), 0);
    }

    #[test]
    fn bar_width_fits_area() {
        assert_eq!(bar_width(200, 3), MAX_BAR_WIDTH);
        // 20 bars in 100 columns: 19 gaps, 81 / 20 = 4
        assert_eq!(bar_width(100, 20), 4);
        assert_eq!(bar_width(5, 20), 1);
        assert_eq!(bar_width(0, 0), 1);
    }

    #[test]
    fn bar_width_survives_more_bars_than_u16() {
        assert_eq!(bar_width(128, 65_536), 1);
        assert_eq!(bar_width(128, 70_000), 1);
        assert_eq!(bar_width(u16::MAX, usize::MAX), 1);
    }
}
