//! Celo insights TUI: single-page balance report in the terminal.
//!
//! Layout:
//! - Sidebar: about box and the table being shown
//! - Page: metric cards, top-N bar chart with a cursor, optional top table,
//!   inflow/outflow table with gradient fill
//! - Status bar: key hints and the last status message
//!
//! Usage: `insights-tui [CONFIG]`. Without a path, `insights.toml` in the
//! working directory is used when present.

mod app;
mod input;
mod theme;
mod ui;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use insights_core::config::InsightsConfig;
use insights_core::logging::init_file_logging;

use crate::app::AppState;

const LOG_FILE: &str = "insights-tui.log";
const DEFAULT_LOG_FILTER: &str = "warn,insights_core=info,insights_tui=info";

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let _ = dotenvy::dotenv();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = InsightsConfig::load(config_path.as_deref()).context("loading config")?;

    // stderr belongs to the terminal UI; logs go to a file next to the exports.
    init_file_logging(&config.paths.export_dir.join(LOG_FILE), DEFAULT_LOG_FILTER)?;

    // Load before entering raw mode so a missing file prints a normal error.
    let mut app = AppState::load(config)?;
    info!(rows = app.table().len(), "starting TUI");

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // 50ms poll keeps the loop responsive without spinning.
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}
