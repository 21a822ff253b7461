use crate::chart::build;
use crate::chart::classify;
use crate::chart::BuildError;
use crate::chart::ChartSpec;
use crate::chart::ChartStyle;
use crate::chart::Palette;
use crate::document::page::ErrorPlaceholder;
use crate::document::page::PageSpec;
use crate::table::Table;
use log::debug;
use log::warn;
use thiserror::Error;

/// A sheet whose charts could not be built.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Sheet '{sheet}': {source}")]
pub struct SheetError {
    pub sheet: String,
    pub source: BuildError,
}

/// Charts of one sheet, all or nothing.
pub fn try_render(sheet: &str, table: &Table, palette: Palette, style: &ChartStyle) -> Result<Vec<ChartSpec>, SheetError> {
    if table.is_empty() {
        debug!("sheet '{}' is empty", sheet);
        return Ok(Vec::new());
    }
    let classification = classify(table);
    debug!(
        "sheet '{}': category {:?}, series {:?}",
        sheet, classification.category, classification.numeric_columns
    );
    build(sheet, table, &classification, palette, style).map_err(|source| SheetError {
        sheet: sheet.to_owned(),
        source,
    })
}

/// Pages of one sheet: its charts, or a single error page when any chart fails.
pub fn render(sheet: &str, table: &Table, palette: Palette, style: &ChartStyle) -> Vec<PageSpec> {
    match try_render(sheet, table, palette, style) {
        Ok(charts) => charts.into_iter().map(PageSpec::Chart).collect(),
        Err(error) => {
            warn!("{}", error);
            vec![PageSpec::Error(ErrorPlaceholder {
                subject: error.sheet,
                message: error.source.to_string(),
            })]
        }
    }
}
