//! Light report theme for the insights TUI.
//!
//! # Color Palette
//! - **Background**: white page, matching the chart's white plot area
//! - **Accent**: Celo green (focus, titles, selected bar)
//! - **Positive / Negative**: green and red for signed flow values
//! - **Muted**: the slate gray used for axis text
//!
//! Bar and gradient colors come from `insights_core::report::palette`; this
//! module only converts them to terminal colors.

use insights_core::report::Rgb;
use ratatui::style::{Color, Modifier, Style};

use crate::app::StatusLevel;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub muted: Color,
    /// Chart title text (#374151)
    pub title: Color,
    pub text_primary: Color,
    /// Sidebar info box fill
    pub info_background: Color,
    pub info_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::report_light()
    }
}

impl Theme {
    pub fn report_light() -> Self {
        Self {
            background: Color::Rgb(255, 255, 255),
            accent: Color::Rgb(53, 208, 127),
            positive: Color::Rgb(26, 152, 80),
            negative: Color::Rgb(215, 48, 39),
            warning: Color::Rgb(217, 119, 6),
            muted: Color::Rgb(107, 114, 128),
            title: Color::Rgb(55, 65, 81),
            text_primary: Color::Rgb(17, 24, 39),
            info_background: Color::Rgb(219, 234, 254),
            info_text: Color::Rgb(30, 58, 138),
        }
    }

    pub fn accent_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text_primary)
    }

    pub fn panel_border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.muted)
        }
    }

    /// Color for a signed flow value (zero counts as positive).
    pub fn signed_color(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn status_style(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => Style::default().fg(self.accent),
            StatusLevel::Warning => Style::default().fg(self.warning),
            StatusLevel::Error => Style::default()
                .fg(self.negative)
                .add_modifier(Modifier::BOLD),
        }
    }
}

/// Terminal color for a report color.
pub fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
