//! # Spreadsheet Reading Module
//!
//! Decodes Excel workbooks (.xlsx, .xlsm, .xlam, .xls, .xla) into a [`Workbook`]:
//! one [`crate::table::Table`] per worksheet, in file order. Failures here are
//! ingestion failures; they abort the run before any sheet is charted.

pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::error::ResultMessage;
use crate::error::RustyChartsError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::Workbook;
use log::debug;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect file format for '{0}'")]
    FileFormatError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Missing part '{0}' in workbook archive")]
    FileError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFoundError(String),

    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),

    #[error("Sheet '{1}' in '{0}' spans {2} rows by {3} columns, more than {4} cells")]
    UsedRangeTooLargeError(String, String, usize, usize, usize),
}

/// Container formats the readers understand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook: a zip archive of XML parts (.xlsx, .xlsm, .xlam)
    Xlsx,
    /// Excel 97-2003 BIFF8 workbook inside an OLE compound file (.xls, .xla)
    Xls,
}

impl SpreadsheetFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<SpreadsheetFormat, SpreadsheetError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") | Some("xlam") => Ok(SpreadsheetFormat::Xlsx),
            Some("xls") | Some("xla") => Ok(SpreadsheetFormat::Xls),
            _ => Err(SpreadsheetError::FileFormatError(path.display().to_string())),
        }
    }
}

impl Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadsheetFormat::Xlsx => write!(f, "xlsx"),
            SpreadsheetFormat::Xls => write!(f, "xls"),
        }
    }
}

/// Common interface of the format readers.
pub(crate) trait Spreadsheet {
    /// Returns the file name this spreadsheet was opened from
    fn name(&self) -> String;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the workbook's shared string table
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyChartsError>;

    /// Reads the cells of every sheet, in workbook order
    fn read_sheets(&mut self) -> Result<Vec<Sheet>, RustyChartsError>;
}

/// Opens a spreadsheet reader over `reader`.
fn open_spreadsheet(name: &str, reader: UnifiedReader, format: SpreadsheetFormat) -> Result<Box<dyn Spreadsheet>, RustyChartsError> {
    debug!("opening '{}' as {}", name, format);
    Ok(match format {
        SpreadsheetFormat::Xlsx => Box::new(XlsxSpreadsheet::open(name, reader)?),
        SpreadsheetFormat::Xls => Box::new(XlsSpreadsheet::open(name, reader)?),
    })
}

/// Decodes every sheet of a spreadsheet into a workbook.
fn load_workbook(mut spreadsheet: Box<dyn Spreadsheet>) -> Result<Workbook, RustyChartsError> {
    let shared_strings = spreadsheet.load_shared_strings()?;
    let mut workbook = Workbook::new();
    for sheet in spreadsheet.read_sheets()? {
        let table = sheet.to_table(&shared_strings)?;
        debug!(
            "sheet '{}': {} columns, {} rows",
            sheet.name,
            table.columns().len(),
            table.row_count(),
        );
        workbook.push(sheet.name, table);
    }
    Ok(workbook)
}

/// Reads the workbook at `path`, choosing the reader by file extension.
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, RustyChartsError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let format = SpreadsheetFormat::from_path(path)?;
    let reader = UnifiedReader::open(path).with_prefix(&name)?;
    let spreadsheet = open_spreadsheet(&name, reader, format).with_prefix(&name)?;
    load_workbook(spreadsheet).with_prefix(&name)
}

/// Reads a workbook held in memory, such as an uploaded file.
pub fn read_workbook(name: &str, bytes: Vec<u8>, format: SpreadsheetFormat) -> Result<Workbook, RustyChartsError> {
    let reader = UnifiedReader::from_bytes(bytes);
    let spreadsheet = open_spreadsheet(name, reader, format).with_prefix(name)?;
    load_workbook(spreadsheet).with_prefix(name)
}

/// Lists sheet names without decoding any cells.
pub fn sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>, RustyChartsError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let format = SpreadsheetFormat::from_path(path)?;
    let reader = UnifiedReader::open(path).with_prefix(&name)?;
    Ok(open_spreadsheet(&name, reader, format).with_prefix(&name)?.sheet_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(SpreadsheetFormat::from_path(Path::new("a/b.xlsx")).unwrap(), SpreadsheetFormat::Xlsx);
        assert_eq!(SpreadsheetFormat::from_path(Path::new("b.XLSM")).unwrap(), SpreadsheetFormat::Xlsx);
        assert_eq!(SpreadsheetFormat::from_path(Path::new("b.xlam")).unwrap(), SpreadsheetFormat::Xlsx);
        assert_eq!(SpreadsheetFormat::from_path(Path::new("b.xls")).unwrap(), SpreadsheetFormat::Xls);
        assert_eq!(SpreadsheetFormat::from_path(Path::new("b.Xla")).unwrap(), SpreadsheetFormat::Xls);
        assert!(SpreadsheetFormat::from_path(Path::new("b.ods")).is_err());
        assert!(SpreadsheetFormat::from_path(Path::new("data")).is_err());
    }

    #[test]
    fn missing_file_is_an_ingestion_error() {
        let error = open_workbook("does/not/exist.xlsx").unwrap_err();
        assert!(error.to_string().starts_with("does/not/exist.xlsx: "), "{error}");
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        assert!(read_workbook("upload.xlsx", b"not a zip".to_vec(), SpreadsheetFormat::Xlsx).is_err());
        assert!(read_workbook("upload.xls", vec![0u8; 1024], SpreadsheetFormat::Xls).is_err());
    }
}
