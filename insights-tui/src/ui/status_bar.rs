//! Bottom status bar: key hints, last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let mut spans: Vec<Span> = Vec::new();

    spans.push(Span::styled(
        " ?:Help q:Quit d:Top CSV D:Full CSV r:Reload",
        theme.muted_style(),
    ));
    spans.push(Span::raw(" | "));

    if let Some((msg, level)) = &app.status_message {
        spans.push(Span::styled(msg.as_str(), theme.status_style(*level)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
