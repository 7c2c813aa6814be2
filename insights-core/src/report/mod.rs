//! Report surfaces shared by the CLI and the TUI.
//!
//! `view` turns a loaded table into the page model, `palette` owns the bar
//! and gradient colors, `export` produces the two CSV downloads, and `html`
//! renders the static single-page report.

pub mod export;
pub mod html;
pub mod palette;
pub mod view;

pub use export::{
    export_all, full_table_csv, top_export_filename, top_n_csv, write_export, ExportError,
    ExportPaths, FULL_EXPORT_FILENAME,
};
pub use html::HtmlReportGenerator;
pub use palette::{bar_color, rd_yl_gn, GradientScale, Rgb, BAR_PALETTE};
pub use view::{BarSpec, CellColors, FlowRow, ReportView};
