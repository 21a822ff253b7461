use crate::error::ResultOptionChain;
use crate::error::RustyChartsError;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::helpers::reader::UnifiedReader;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::excel::number_format;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use either::Either;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

// BIFF8 record type identifiers for Excel file parsing
const FORMULA: u16 = 6;        // Formula record containing calculation expressions
const EOF: u16 = 10;           // End of file record marking the end of a substream
const DATE1904: u16 = 34;      // Date system flag (1904 vs 1900 base)
const FILE_PASS: u16 = 47;     // File password protection record
const CODE_PAGE: u16 = 66;     // Character encoding specification
const BOUND_SHEET8: u16 = 133; // Worksheet definition and position
const MUL_RK: u16 = 189;       // Multiple RK number records for efficiency
const XF: u16 = 224;           // Extended format record for cell styling
const SST: u16 = 252;          // Shared string table containing repeated text
const LABEL_SST: u16 = 253;    // Label referencing shared string table
const NUMBER: u16 = 515;       // Numeric cell value
const LABEL: u16 = 516;        // Text label cell value
const BOOL_ERR: u16 = 517;     // Boolean or error cell value
const STRING: u16 = 519;       // String value for formula results
const RK: u16 = 638;           // RK number format for compressed numeric storage
const FORMAT: u16 = 1054;      // Custom number format definition
const BOF: u16 = 2057;         // Beginning of file record for substreams

/// BOUNDSHEET8 sheet type of an ordinary worksheet
const WORKSHEET: u8 = 0;

/// Error types specific to XLS file parsing
#[derive(Error, Debug)]
pub enum XlsError {
    /// Invalid character encoding code page encountered
    #[error("Invalid Code page '{0}'")]
    CodePageError(u16),

    /// Invalid formula value or structure encountered
    #[error("Invalid Formula value '{0}'")]
    FormulaValueError(u64),
}

/// Main structure for reading and parsing XLS (Excel 97-2003) files
pub(crate) struct XlsSpreadsheet {
    /// Original file name for error reporting and identification
    pub(crate) name: String,
    /// BIFF8 reader for parsing Excel binary format records
    reader: Biff8Reader,
    /// Shared string table containing repeated text values
    shared_strings: Vec<String>,
    /// Number format mappings for cell type detection
    number_formats: Vec<CellType>,
    /// List of worksheets with their names and stream positions
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    /// Opens an XLS workbook and reads its global substream
    ///
    /// # Arguments
    /// * `file_name` - Name used in error messages
    /// * `reader` - Source of the compound file bytes
    pub(crate) fn open(file_name: &str, mut reader: UnifiedReader) -> Result<XlsSpreadsheet, RustyChartsError> {
        let cfb = Cfb::new(&mut reader)?;
        let reader = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .map(Biff8Reader::new)
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;
        Self::from_stream(file_name, reader)
    }

    /// Reads the global substream: date system, code page, formats, shared strings and sheet list
    fn from_stream(file_name: &str, mut reader: Biff8Reader) -> Result<XlsSpreadsheet, RustyChartsError> {
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut custom_formats: HashMap<String, CellType> = HashMap::new();
        let mut format_indexes: Vec<String> = Vec::new();
        let mut sheets: Vec<(String, usize)> = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
            DATE1904 if reader.read_u16()? == 1 => is_1904 = true,
            CODE_PAGE => {
                let code_page = reader.read_u16()?;
                reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePageError(code_page))?;
            }
            FORMAT => {
                let id = reader.read_u16()?;
                let format = reader.read_xl_unicode_string()?;
                custom_formats.insert(
                    id.to_string(),
                    CellType::parse_custom_number_format(format.as_ref(), is_1904),
                );
            }
            XF => {
                reader.skip(2)?;
                let id = reader.read_u16()?;
                format_indexes.push(id.to_string());
            }
            SST => shared_strings = load_shared_strings(&mut reader)?,
            BOUND_SHEET8 => {
                let pointer = reader.read_usize()?;
                let visibility = reader.read_u8()?;
                let sheet_type = reader.read_u8()?;
                let sheet_name = reader.read_short_xl_unicode_string()?;
                // Chart, macro and VBA sheets carry no cell grid
                if sheet_type == WORKSHEET {
                    sheets.push((sheet_name, pointer));
                } else {
                    debug!("skipping non-worksheet '{}' (type {}, visibility {})", sheet_name, sheet_type, visibility);
                }
            }
        });
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }

        let number_formats = load_number_formats(format_indexes, custom_formats, is_1904);

        Ok(XlsSpreadsheet {
            name: file_name.to_owned(),
            reader,
            shared_strings,
            number_formats,
            sheets,
        })
    }

    /// Reads the cell records of the substream starting at `pointer`
    fn read_sheet(&mut self, sheet_name: &str, pointer: usize) -> Result<Sheet, RustyChartsError> {
        let mut sheet = Sheet::new(&self.name, sheet_name);
        self.reader.goto(pointer);
        // Skip the sheet's BOF record
        self.reader.next()?;
        while let Some(tag) = self.reader.next()? {
            match tag {
                BOF | EOF => break,
                MUL_RK => {
                    let row = self.reader.read_u16()? as usize;
                    let col_lower_bound = self.reader.read_u16()? as usize;
                    let col_upper_bound = self.reader.get_u16_back(2)? as usize;
                    for col in col_lower_bound..=col_upper_bound {
                        let index = self.reader.read_u16()? as usize;
                        let kind = number_format(&self.number_formats, index);
                        let value = self.reader.read_rk_number()?;
                        sheet.push(Cell {
                            row,
                            col,
                            kind,
                            value: value.to_string(),
                        });
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = self.reader.read_u16()? as usize;
                    let col = self.reader.read_u16()? as usize;
                    let (either, value) = match tag {
                        BOOL_ERR => read_bool_or_error_cell(&mut self.reader)?,
                        NUMBER => read_number_cell(&mut self.reader)?,
                        RK => read_rk_cell(&mut self.reader)?,
                        LABEL_SST => read_label_sst_cell(&mut self.reader)?,
                        LABEL => read_label_cell(&mut self.reader)?,
                        _ => read_formula_cell(&mut self.reader)?,
                    };
                    let kind = match either {
                        Either::Left(kind) => kind,
                        Either::Right(index) => number_format(&self.number_formats, index),
                    };
                    if !value.is_empty() {
                        sheet.push(Cell {
                            row,
                            col,
                            kind,
                            value,
                        });
                    }
                }
                _ => (),
            }
        }
        Ok(sheet)
    }
}

impl Spreadsheet for XlsSpreadsheet {
    /// Returns the file name the workbook was opened from
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// The SST record is part of the global substream, so the table is already loaded
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyChartsError> {
        Ok(self.shared_strings.to_owned())
    }

    fn read_sheets(&mut self) -> Result<Vec<Sheet>, RustyChartsError> {
        let mut sheets = Vec::<Sheet>::with_capacity(self.sheets.len());
        for (sheet_name, pointer) in self.sheets.clone() {
            sheets.push(self.read_sheet(&sheet_name, pointer)?);
        }
        Ok(sheets)
    }
}

/// Loads the shared string table from BIFF8 SST record
///
/// Shared strings are stored once in the file and referenced by index
/// to reduce file size for repeated text values.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at SST record
///
/// # Returns
/// * `Result<Vec<String>>` - Vector of shared string values
fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, RustyChartsError> {
    let mut shared_strings: Vec<String> = Vec::new();
    reader.skip(4)?;
    let count = reader.read_usize()?;
    for _ in 0..count {
        let string = reader.read_xl_unicode_rich_extended_string()?;
        shared_strings.push(string);
    }
    Ok(shared_strings)
}

/// Reads a BOOL_ERR record containing boolean or error cell values
///
/// BOOL_ERR records store either boolean values (TRUE/FALSE) or error codes
/// with a flag indicating the value type.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at BOOL_ERR record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Cell type and value
fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let flag = reader.read_u8()?;
    let kind = if flag == 0 {
        CellType::Boolean
    } else {
        CellType::Error
    };
    let value = if flag == 0 {
        value.to_string()
    } else {
        to_error_value(value).to_owned()
    };
    Ok((Either::Left(kind), value))
}

/// Reads a NUMBER record containing numeric cell values
///
/// NUMBER records store double-precision floating point numbers
/// with an associated format index for cell type detection.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at NUMBER record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Format index and numeric value
fn read_number_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(index), value.to_string()))
}

/// Reads an RK record containing compressed numeric values
///
/// RK records use a compressed format to store integers and floating point
/// numbers more efficiently than standard NUMBER records.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at RK record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Format index and numeric value
fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(index), value.to_string()))
}

/// Reads a LABEL_SST record referencing shared string table
///
/// LABEL_SST records contain an index into the shared string table
/// rather than storing the string value directly.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at LABEL_SST record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Shared string type and index
fn read_label_sst_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    reader.skip(2)?;
    let value = reader.read_usize()?;
    Ok((Either::Left(CellType::SharedString), value.to_string()))
}

/// Reads a LABEL record containing inline string values
///
/// LABEL records store string values directly in the cell record
/// rather than referencing the shared string table.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at LABEL record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Inline string type and value
fn read_label_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    reader.skip(2)?;
    let value = reader.read_xl_unicode_string()?;
    Ok((Either::Left(CellType::InlineString), value))
}

/// Reads a FORMULA record containing calculation expressions
///
/// FORMULA records can contain numeric results, string results, boolean values,
/// error codes, or empty strings depending on the formula type and flags.
///
/// # Arguments
/// * `reader` - BIFF8 reader positioned at FORMULA record
///
/// # Returns
/// * `Result<(Either<CellType, usize>, String)>` - Cell type and formula result
fn read_formula_cell(
    reader: &mut Biff8Reader,
) -> Result<(Either<CellType, usize>, String), RustyChartsError> {
    let index = reader.read_u16()? as usize;
    let formula = reader.read_u64()?;
    let is_number = (formula & 0xFFFF000000000000) != 0xFFFF000000000000;
    let flag = formula & 0xFF;
    if is_number {
        Ok((Either::Right(index), f64::from_bits(formula).to_string(),))
    } else if flag == 0 {
        if let Some(kind) = reader.next()? {
            if kind == STRING {
                // Read Next String
                let value = reader.read_xl_unicode_string()?;
                Ok((Either::Left(CellType::InlineString), value))
            } else {
                Err(XlsError::FormulaValueError(formula))?
            }
        } else {
            Err(XlsError::FormulaValueError(formula))?
        }
    } else if flag == 1 {
        let value = if (formula & 0xFF0000) > 0 { "1" } else { "0" };
        Ok((Either::Left(CellType::Boolean), value.to_owned()))
    } else if flag == 2 {
        let code = ((formula >> 16) & 0xFF) as u8;
        let value = to_error_value(code).to_owned();
        Ok((Either::Left(CellType::Error), value))
    } else if flag == 3 {
        Ok((Either::Left(CellType::InlineString), "".to_owned()))
    } else {
        Err(XlsError::FormulaValueError(formula))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: u16, body: &[u8]) -> Vec<u8> {
        let mut bytes = kind.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(body.len() as u16).to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    fn cell(row: u16, col: u16, xf: u16, rest: &[u8]) -> Vec<u8> {
        let mut body = row.to_le_bytes().to_vec();
        body.extend_from_slice(&col.to_le_bytes());
        body.extend_from_slice(&xf.to_le_bytes());
        body.extend_from_slice(rest);
        body
    }

    fn compressed(text: &[u8]) -> Vec<u8> {
        let mut bytes = (text.len() as u16).to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(text);
        bytes
    }

    fn bound_sheet(pointer: u32, sheet_type: u8, name: &[u8]) -> Vec<u8> {
        let mut body = pointer.to_le_bytes().to_vec();
        body.extend_from_slice(&[0, sheet_type, name.len() as u8, 0]);
        body.extend_from_slice(name);
        record(BOUND_SHEET8, &body)
    }

    fn rk_integer(value: i32) -> [u8; 4] {
        (((value as u32) << 2) | 0x02).to_le_bytes()
    }

    /// A global substream with one worksheet and one chart sheet, followed by the worksheet's cells
    fn workbook_stream() -> Vec<u8> {
        let sheet_records = [
            record(BOF, &[0; 16]),
            record(LABEL_SST, &cell(0, 0, 0, &0u32.to_le_bytes())),
            record(LABEL, &cell(0, 1, 0, &compressed(b"Sales"))),
            record(LABEL, &cell(0, 2, 0, &compressed(b"Day"))),
            record(LABEL_SST, &cell(1, 0, 0, &1u32.to_le_bytes())),
            record(NUMBER, &cell(1, 1, 0, &12.5f64.to_le_bytes())),
            record(RK, &cell(1, 2, 1, &rk_integer(45292))),
            record(BOOL_ERR, &cell(2, 0, 0, &[7, 1])),
            {
                let mut body = 2u16.to_le_bytes().to_vec();
                body.extend_from_slice(&1u16.to_le_bytes());
                for value in [3, 4] {
                    body.extend_from_slice(&0u16.to_le_bytes());
                    body.extend_from_slice(&rk_integer(value));
                }
                body.extend_from_slice(&2u16.to_le_bytes());
                record(MUL_RK, &body)
            },
            record(EOF, &[]),
        ]
        .concat();

        let mut sst = 2u32.to_le_bytes().to_vec();
        sst.extend_from_slice(&2u32.to_le_bytes());
        sst.extend_from_slice(&compressed(b"Region"));
        sst.extend_from_slice(&compressed(b"North"));

        let mut format = 164u16.to_le_bytes().to_vec();
        format.extend_from_slice(&compressed(b"yyyy-mm-dd"));

        let globals = |pointer: u32| {
            [
                record(BOF, &[0; 16]),
                record(CODE_PAGE, &1252u16.to_le_bytes()),
                record(FORMAT, &format),
                record(XF, &[0, 0, 0, 0]),
                record(XF, &[0, 0, 164, 0]),
                record(SST, &sst),
                bound_sheet(pointer, 2, b"Chart1"),
                bound_sheet(pointer, 0, b"Q\x80"),
                record(EOF, &[]),
            ]
            .concat()
        };
        let pointer = globals(0).len() as u32;
        [globals(pointer), sheet_records].concat()
    }

    #[test]
    fn reads_global_substream() {
        let spreadsheet = XlsSpreadsheet::from_stream("book.xls", Biff8Reader::new(workbook_stream())).unwrap();
        assert_eq!(spreadsheet.sheet_names(), vec!["Q€"]);
        assert_eq!(spreadsheet.shared_strings, vec!["Region", "North"]);
        assert_eq!(spreadsheet.number_formats, vec![CellType::Number, CellType::NumberDate1900]);
    }

    #[test]
    fn reads_sheet_cells() {
        let mut spreadsheet = XlsSpreadsheet::from_stream("book.xls", Biff8Reader::new(workbook_stream())).unwrap();
        let sheets = spreadsheet.read_sheets().unwrap();
        assert_eq!(sheets.len(), 1);
        let cells: Vec<(usize, usize, CellType, &str)> = sheets[0]
            .cells
            .iter()
            .map(|cell| (cell.row, cell.col, cell.kind, cell.value.as_str()))
            .collect();
        assert_eq!(
            cells,
            vec![
                (0, 0, CellType::SharedString, "0"),
                (0, 1, CellType::InlineString, "Sales"),
                (0, 2, CellType::InlineString, "Day"),
                (1, 0, CellType::SharedString, "1"),
                (1, 1, CellType::Number, "12.5"),
                (1, 2, CellType::NumberDate1900, "45292"),
                (2, 0, CellType::Error, "#DIV/0!"),
                (2, 1, CellType::Number, "3"),
                (2, 2, CellType::Number, "4"),
            ],
        );
    }

    #[test]
    fn rejects_encrypted_workbooks() {
        let stream = [record(BOF, &[0; 16]), record(FILE_PASS, &[0; 6]), record(EOF, &[])].concat();
        let error = XlsSpreadsheet::from_stream("secret.xls", Biff8Reader::new(stream)).err().unwrap();
        assert!(error.to_string().contains("password"), "{error}");
    }

    #[test]
    fn rejects_workbooks_without_worksheets() {
        let stream = [record(BOF, &[0; 16]), bound_sheet(0, 2, b"Chart1"), record(EOF, &[])].concat();
        let error = XlsSpreadsheet::from_stream("charts.xls", Biff8Reader::new(stream)).err().unwrap();
        assert!(error.to_string().contains("no sheets"), "{error}");
    }

    #[test]
    fn reads_formula_results() {
        let string_result = [
            record(FORMULA, &[0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF]),
            record(STRING, &compressed(b"total")),
        ]
        .concat();
        let mut reader = Biff8Reader::new(string_result);
        reader.next().unwrap();
        let (kind, value) = read_formula_cell(&mut reader).unwrap();
        assert_eq!(kind, Either::Left(CellType::InlineString));
        assert_eq!(value, "total");

        let mut body = 0u16.to_le_bytes().to_vec();
        body.extend_from_slice(&2.5f64.to_le_bytes());
        let mut reader = Biff8Reader::new(record(FORMULA, &body));
        reader.next().unwrap();
        let (kind, value) = read_formula_cell(&mut reader).unwrap();
        assert_eq!(kind, Either::Right(0));
        assert_eq!(value, "2.5");

        let mut reader = Biff8Reader::new(record(FORMULA, &[0, 0, 1, 0, 1, 0, 0, 0, 0xFF, 0xFF]));
        reader.next().unwrap();
        let (kind, value) = read_formula_cell(&mut reader).unwrap();
        assert_eq!(kind, Either::Left(CellType::Boolean));
        assert_eq!(value, "1");
    }
}
