//! # Output Rendering
//!
//! A [`Paginator`] turns an assembled [`Document`] into the bytes of one
//! output file. [`PdfPaginator`] draws one PDF page per page of the document;
//! [`PlanWriter`] dumps the chart plan itself as JSON.

mod fonts;
mod page;
mod pdf;
mod plan;

use crate::chart::ChartStyle;
use crate::document::Document;
use crate::document::PageSpec;
use log::debug;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use plan::PlanWriter;

/// Default name of the rendered document
pub const OUTPUT_FILE_NAME: &str = "charts.pdf";

/// Media type of the rendered document
pub const MEDIA_TYPE: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot write '{0}': {1}")]
    WriteError(String, std::io::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),
}

/// Renders a whole document into the bytes of one file.
pub trait Paginator {
    fn paginate(&self, document: &Document) -> Result<Vec<u8>, RenderError>;

    fn media_type(&self) -> &'static str;

    /// Renders the document and writes it to `path`.
    ///
    /// Nothing is written when rendering fails.
    fn write_to(&self, document: &Document, path: &Path) -> Result<(), RenderError> {
        let bytes = self.paginate(document)?;
        debug!("writing {} bytes of {} to '{}'", bytes.len(), self.media_type(), path.display());
        fs::write(path, bytes).map_err(|error| RenderError::WriteError(path.display().to_string(), error))
    }
}

/// Draws every page of a document into one PDF file.
#[derive(Clone, Debug, Default)]
pub struct PdfPaginator {
    /// Page size and text layout of error pages
    style: ChartStyle,
}

impl PdfPaginator {
    pub fn new(style: ChartStyle) -> PdfPaginator {
        PdfPaginator { style }
    }
}

impl Paginator for PdfPaginator {
    fn paginate(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let pages = document
            .pages
            .iter()
            .map(|page| match page {
                PageSpec::Chart(chart) => page::chart_page(chart),
                PageSpec::Error(error) => page::error_page(error, &self.style),
            })
            .collect();
        Ok(pdf::write_pdf(pages))
    }

    fn media_type(&self) -> &'static str {
        MEDIA_TYPE
    }
}
