//! Application state: single-owner, main-thread only.
//!
//! The loaded table and its report view live here together with the cursor
//! state. Reloads go through the table cache, so pressing `r` on an unchanged
//! file costs one `stat`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use insights_core::config::InsightsConfig;
use insights_core::data::{CacheStats, LoadError, TableCache};
use insights_core::domain::BalanceTable;
use insights_core::report::{
    full_table_csv, top_export_filename, top_n_csv, write_export, BarSpec, ExportError,
    ReportView, FULL_EXPORT_FILENAME,
};

use crate::theme::Theme;

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Modal overlay drawn on top of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
}

/// Which download a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    TopN,
    FullTable,
}

pub struct AppState {
    pub config: InsightsConfig,
    pub theme: Theme,
    cache: TableCache,
    table: Arc<BalanceTable>,
    pub view: ReportView,
    /// Index into `view.bars`.
    pub selected_bar: usize,
    /// First visible row of the flow table.
    pub flow_scroll: usize,
    pub show_top_table: bool,
    pub overlay: Overlay,
    pub status_message: Option<(String, StatusLevel)>,
    pub running: bool,
}

impl AppState {
    /// Load the balances CSV named by the config. A missing or malformed file
    /// is a startup error.
    pub fn load(config: InsightsConfig) -> Result<Self, LoadError> {
        let mut cache = TableCache::new();
        let table = cache.load(&config.paths.balances_csv)?;
        let view = ReportView::build(&table, config.report.top_n);
        let status = format!(
            "Loaded {} rows from {}",
            table.len(),
            config.paths.balances_csv.display()
        );
        let duplicates = table.duplicate_address_count();
        let mut app = Self {
            config,
            theme: Theme::default(),
            cache,
            table,
            view,
            selected_bar: 0,
            flow_scroll: 0,
            show_top_table: false,
            overlay: Overlay::None,
            status_message: Some((status, StatusLevel::Info)),
            running: true,
        };
        if duplicates > 0 {
            app.set_warning(format!("{duplicates} duplicate addresses in table"));
        }
        Ok(app)
    }

    pub fn table(&self) -> &BalanceTable {
        &self.table
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Size on disk of the table currently shown.
    pub fn cached_file_len(&self) -> Option<u64> {
        self.cache.cached_key().map(|key| key.len)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }

    // ── Bar cursor ───────────────────────────────────────────────────

    pub fn selected(&self) -> Option<&BarSpec> {
        self.view.bars.get(self.selected_bar)
    }

    pub fn select_next_bar(&mut self) {
        if self.selected_bar + 1 < self.view.bars.len() {
            self.selected_bar += 1;
        }
    }

    pub fn select_prev_bar(&mut self) {
        self.selected_bar = self.selected_bar.saturating_sub(1);
    }

    pub fn select_first_bar(&mut self) {
        self.selected_bar = 0;
    }

    pub fn select_last_bar(&mut self) {
        self.selected_bar = self.view.bars.len().saturating_sub(1);
    }

    // ── Flow table scrolling ─────────────────────────────────────────

    pub fn scroll_flows(&mut self, delta: isize) {
        let max = self.view.flows.len().saturating_sub(1);
        self.flow_scroll = self.flow_scroll.saturating_add_signed(delta).min(max);
    }

    pub fn toggle_top_table(&mut self) {
        self.show_top_table = !self.show_top_table;
    }

    pub fn toggle_help(&mut self) {
        self.overlay = match self.overlay {
            Overlay::Help => Overlay::None,
            Overlay::None => Overlay::Help,
        };
    }

    // ── Reload and downloads ─────────────────────────────────────────

    /// Re-read the balances file if it changed on disk. Keeps the current
    /// view when the file is unchanged or fails to load.
    pub fn reload(&mut self) {
        let path = self.config.paths.balances_csv.clone();
        match self.cache.load(&path) {
            Ok(table) if Arc::ptr_eq(&table, &self.table) => {
                self.set_status("Data unchanged on disk");
            }
            Ok(table) => {
                self.view = ReportView::build(&table, self.config.report.top_n);
                self.table = table;
                self.selected_bar = self.selected_bar.min(self.view.bars.len().saturating_sub(1));
                self.flow_scroll = self.flow_scroll.min(self.view.flows.len().saturating_sub(1));
                info!(rows = self.table.len(), "balances reloaded");
                self.set_status(format!("Reloaded {} rows", self.table.len()));
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.set_error(format!("Reload failed: {e}"));
            }
        }
    }

    /// Drop the cached table and read the file again even if it looks unchanged.
    pub fn force_reload(&mut self) {
        self.cache.invalidate();
        self.reload();
    }

    /// Write a CSV download into the export directory and report it in the
    /// status bar.
    pub fn download(&mut self, which: Download) {
        match self.write_download(which) {
            Ok(path) => {
                let at = chrono::Local::now().format("%H:%M:%S");
                self.set_status(format!("CSV saved to {} at {at}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "download failed");
                self.set_error(format!("Download failed: {e}"));
            }
        }
    }

    fn write_download(&self, which: Download) -> Result<PathBuf, ExportError> {
        let dir = &self.config.paths.export_dir;
        let source = &self.config.paths.balances_csv;
        match which {
            Download::TopN => {
                let n = self.view.top_n;
                let csv = top_n_csv(&self.table, n)?;
                write_export(dir, &top_export_filename(n), &csv, source)
            }
            Download::FullTable => {
                write_export(dir, FULL_EXPORT_FILENAME, &full_table_csv(&self.table)?, source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const CSV: &str = "address,balance,tokens_in,tokens_out,balance_changed\n\
0x1111111111111111,100,10,0,10\n\
0x2222222222222222,300,0,5,-5\n\
0x3333333333333333,50,,,\n";

    fn config_in(dir: &Path) -> InsightsConfig {
        let mut config = InsightsConfig::default();
        config.paths.balances_csv = dir.join("celo_balances.csv");
        config.paths.export_dir = dir.join("exports");
        config
    }

    fn app_in(dir: &Path) -> AppState {
        std::fs::write(dir.join("celo_balances.csv"), CSV).unwrap();
        AppState::load(config_in(dir)).unwrap()
    }

    #[test]
    fn load_builds_view() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());
        assert_eq!(app.view.bars.len(), 3);
        assert_eq!(app.selected().unwrap().address, "0x2222222222222222");
        assert!(app.running);
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Info);
    }

    #[test]
    fn duplicate_addresses_warn_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("celo_balances.csv"),
            "address,balance,tokens_in,tokens_out,balance_changed\n0xa,1,,,\n0xa,2,,,\n",
        )
        .unwrap();
        let app = AppState::load(config_in(dir.path())).unwrap();
        assert_eq!(app.view.bars.len(), 2);
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Warning);
    }

    #[test]
    fn missing_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::load(config_in(dir.path())).is_err());
    }

    #[test]
    fn bar_cursor_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.select_prev_bar();
        assert_eq!(app.selected_bar, 0);
        app.select_next_bar();
        app.select_next_bar();
        app.select_next_bar();
        assert_eq!(app.selected_bar, 2);
        app.select_first_bar();
        assert_eq!(app.selected_bar, 0);
        app.select_last_bar();
        assert_eq!(app.selected_bar, 2);
    }

    #[test]
    fn flow_scroll_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.scroll_flows(-3);
        assert_eq!(app.flow_scroll, 0);
        app.scroll_flows(10);
        assert_eq!(app.flow_scroll, 2);
    }

    #[test]
    fn reload_unchanged_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.reload();
        assert_eq!(
            app.status_message.as_ref().unwrap().0,
            "Data unchanged on disk"
        );
    }

    #[test]
    fn reload_picks_up_changes_and_clamps_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.select_last_bar();

        std::fs::write(
            dir.path().join("celo_balances.csv"),
            "address,balance,tokens_in,tokens_out,balance_changed\n0xonly,1,,,\n",
        )
        .unwrap();
        app.reload();

        assert_eq!(app.view.bars.len(), 1);
        assert_eq!(app.selected_bar, 0);
        assert_eq!(app.status_message.as_ref().unwrap().0, "Reloaded 1 rows");
    }

    #[test]
    fn reload_counts_cache_hits_and_force_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        assert_eq!(app.cache_stats().misses, 1);
        assert_eq!(app.cached_file_len(), Some(CSV.len() as u64));

        app.reload();
        assert_eq!(app.cache_stats().hits, 1);

        app.force_reload();
        assert_eq!(app.cache_stats().misses, 2);
        assert_eq!(app.status_message.as_ref().unwrap().0, "Reloaded 3 rows");
    }

    #[test]
    fn failed_reload_keeps_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        std::fs::write(dir.path().join("celo_balances.csv"), "address\n0xa\n").unwrap();
        app.reload();
        assert_eq!(app.view.bars.len(), 3);
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Error);
    }

    #[test]
    fn downloads_write_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.download(Download::TopN);
        let top = dir.path().join("exports/top20_celo_balances.csv");
        let content = std::fs::read_to_string(&top).unwrap();
        assert!(content.starts_with("address,balance\n0x2222222222222222,300.0\n"));

        app.download(Download::FullTable);
        assert!(dir.path().join("exports/celo_balances.csv").exists());
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(level, StatusLevel::Info);
        assert!(msg.starts_with("CSV saved to "));
    }

    #[test]
    fn full_download_never_overwrites_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("celo_balances.csv"), CSV).unwrap();
        let mut config = config_in(dir.path());
        config.paths.export_dir = dir.path().to_path_buf();
        let mut app = AppState::load(config).unwrap();

        app.download(Download::FullTable);
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(level, StatusLevel::Error);
        assert!(msg.contains("refusing to overwrite"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("celo_balances.csv")).unwrap(),
            CSV
        );

        app.download(Download::TopN);
        assert!(dir.path().join("top20_celo_balances.csv").exists());
    }

    #[test]
    fn toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.toggle_top_table();
        assert!(app.show_top_table);
        app.toggle_help();
        assert_eq!(app.overlay, Overlay::Help);
        app.toggle_help();
        assert_eq!(app.overlay, Overlay::None);
    }
}
