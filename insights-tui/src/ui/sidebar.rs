//! Sidebar: "About" info box and data provenance.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::AppState;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let report = &app.config.report;

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let info_style = Style::default()
        .fg(theme.info_text)
        .bg(theme.info_background);
    let about = vec![
        Line::from(Span::styled(format!("{} Dashboard", report.title), info_style)),
        Line::from(""),
        Line::from(Span::styled(
            format!("Data source: {}", report.data_source),
            info_style,
        )),
        Line::from(""),
        Line::from(Span::styled("Built with Rust + ratatui.", info_style)),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(false))
        .title(" About ")
        .title_style(theme.accent_bold());
    f.render_widget(
        Paragraph::new(about)
            .style(info_style)
            .block(block)
            .wrap(Wrap { trim: true }),
        parts[0],
    );

    let table = app.table();
    let source = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border(false))
        .title(" Table ");
    let mut lines = vec![
        Line::from(Span::styled(
            app.config.paths.balances_csv.display().to_string(),
            theme.text_style(),
        )),
        Line::from(Span::styled(
            format!("{} rows", table.len()),
            theme.muted_style(),
        )),
    ];
    if let Some(len) = app.cached_file_len() {
        lines.push(Line::from(Span::styled(
            format!("{len} bytes"),
            theme.muted_style(),
        )));
    }
    let stats = app.cache_stats();
    lines.push(Line::from(Span::styled(
        format!("cache: {} hits, {} loads", stats.hits, stats.misses),
        theme.muted_style(),
    )));
    f.render_widget(
        Paragraph::new(lines).block(source).wrap(Wrap { trim: true }),
        parts[1],
    );
}
