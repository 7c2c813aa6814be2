//! Top-level UI layout: sidebar, single report page, status bar.

pub mod chart_panel;
pub mod flow_panel;
pub mod help;
pub mod metrics_panel;
pub mod sidebar;
pub mod status_bar;
pub mod top_table;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Overlay};

const SIDEBAR_WIDTH: u16 = 32;
/// Rows of the expandable top-N table before it scrolls off.
const TOP_TABLE_MAX_ROWS: u16 = 10;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: body + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        f.area(),
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
        .split(chunks[0]);

    sidebar::render(f, columns[0], app);
    draw_page(f, columns[1], app);
    status_bar::render(f, chunks[1], app);

    if app.overlay == Overlay::Help {
        help::render(f, chunks[0], app);
    }
}

fn draw_page(f: &mut Frame, area: Rect, app: &AppState) {
    let top_table_height = if app.show_top_table {
        top_table_height(app.view.bars.len())
    } else {
        0
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(1),
            Constraint::Length(top_table_height),
            Constraint::Min(8),
        ])
        .split(area);

    draw_header(f, rows[0], app);
    metrics_panel::render(f, rows[1], app);
    chart_panel::render(f, rows[2], app);
    chart_panel::render_detail(f, rows[3], app);
    if app.show_top_table {
        top_table::render(f, rows[4], app);
    }
    flow_panel::render(f, rows[5], app);
}

/// Borders and header plus up to `TOP_TABLE_MAX_ROWS` rows.
fn top_table_height(rows: usize) -> u16 {
    u16::try_from(rows)
        .unwrap_or(u16::MAX)
        .min(TOP_TABLE_MAX_ROWS)
        + 3
}

fn draw_header(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let lines = vec![
        Line::from(Span::styled(
            app.config.report.title.as_str(),
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            app.config.report.subtitle.as_str(),
            theme.muted_style(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
