//! # Rusty Charts
//!
//! Reads an Excel workbook and turns every numeric column of every sheet into
//! a styled bar chart, collected into one paginated PDF.
//!
//! ## Pipeline
//!
//! - [`spreadsheet`] decodes `.xlsx`/`.xlsm`/`.xlam` (OOXML) and `.xls`/`.xla`
//!   (BIFF8) files into a [`table::Workbook`]
//! - [`chart`] classifies the columns of a sheet and builds one
//!   [`chart::ChartSpec`] per numeric column
//! - [`document`] assembles the pages of all sheets, replacing a sheet that
//!   cannot be charted with a single error page
//! - [`render`] draws the pages into a PDF, or dumps the plan as JSON
//!
//! ```no_run
//! use rusty_charts::chart::{ChartStyle, Palette};
//! use rusty_charts::render::{Paginator, PdfPaginator};
//!
//! let workbook = rusty_charts::open_workbook("results.xlsx")?;
//! let document = rusty_charts::assemble(&workbook, Palette::BlueGrey, &ChartStyle::default());
//! PdfPaginator::default().write_to(&document, "charts.pdf".as_ref())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod helpers;

pub mod chart;
pub mod config;
pub mod document;
pub mod render;
pub mod spreadsheet;
pub mod table;

pub use document::assemble;
pub use document::assemble_filtered;
pub use error::RustyChartsError;
pub use spreadsheet::open_workbook;
pub use spreadsheet::read_workbook;
pub use spreadsheet::sheet_names;
pub use spreadsheet::SpreadsheetFormat;
