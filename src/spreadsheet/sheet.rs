use crate::error::RustyChartsError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Column;
use crate::table::Table;
use crate::table::Value;
use std::collections::HashSet;

/// Largest used range, in cells, that is expanded into a table.
const MAX_USED_RANGE_CELLS: usize = 16 * 1024 * 1024;

/// Raw cells of one worksheet, as decoded from the file.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// Non-empty cells in the order they were read
    pub(crate) cells: Vec<Cell>,
    /// Used range, determined from the cells
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(super) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a non-empty cell and widens the used range.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Groups the cells by column of the used range, each column sorted by row.
    /// Later cells win when two share a position.
    fn cells_by_column(&self, col_lower: usize, width: usize) -> Vec<Vec<&Cell>> {
        let mut columns: Vec<Vec<&Cell>> = vec![Vec::new(); width];
        for cell in &self.cells {
            columns[cell.col - col_lower].push(cell);
        }
        for cells in &mut columns {
            cells.sort_by_key(|cell| cell.row);
            cells.reverse();
            cells.dedup_by_key(|cell| cell.row);
            cells.reverse();
        }
        columns
    }

    /// Converts the sheet into a table.
    ///
    /// The first row of the used range is the header. Blank header cells are named
    /// `Unnamed: {i}` and repeated names get `.1`, `.2`, ... suffixes.
    pub(crate) fn to_table(&self, shared_strings: &[String]) -> Result<Table, RustyChartsError> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) =
            (self.row_lower_bound, self.row_upper_bound, self.col_lower_bound, self.col_upper_bound)
        else {
            return Ok(Table::default());
        };
        let (height, width) = (row_upper - row_lower + 1, col_upper - col_lower + 1);
        if height.saturating_mul(width) > MAX_USED_RANGE_CELLS {
            return Err(SpreadsheetError::UsedRangeTooLargeError(
                self.file_name.to_owned(),
                self.name.to_owned(),
                height,
                width,
                MAX_USED_RANGE_CELLS,
            ).into());
        }

        let mut names = Vec::<String>::with_capacity(width);
        let mut columns = Vec::<Vec<Value>>::with_capacity(width);
        for cells in self.cells_by_column(col_lower, width) {
            let (header, records) = match cells.split_first() {
                Some((header, records)) if header.row == row_lower => (Some(*header), records),
                _ => (None, cells.as_slice()),
            };
            names.push(match header {
                Some(cell) => self.value_of(cell, shared_strings, false)?.to_string(),
                None => String::new(),
            });

            let is_boolean_column = records.iter().all(|cell| cell.kind == CellType::Boolean);
            let mut values = vec![Value::Empty; height - 1];
            for cell in records {
                values[cell.row - row_lower - 1] = self.value_of(cell, shared_strings, is_boolean_column)?;
            }
            columns.push(values);
        }

        let columns = deduplicate_names(names)
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Ok(Table::new(columns))
    }

    fn value_of(&self, cell: &Cell, shared_strings: &[String], is_boolean_column: bool) -> Result<Value, RustyChartsError> {
        cell.to_value(shared_strings, is_boolean_column).map_err(|message| {
            SpreadsheetError::CellValueError(
                self.file_name.to_owned(),
                self.name.to_owned(),
                cell.reference(),
                message,
            ).into()
        })
    }
}

/// Fills in blank header names and makes repeated names unique.
fn deduplicate_names(names: Vec<String>) -> Vec<String> {
    let mut used = HashSet::<String>::new();
    let mut unique = Vec::<String>::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        let name = if name.trim().is_empty() {
            format!("Unnamed: {index}")
        } else {
            name
        };
        let mut candidate = name.clone();
        let mut suffix = 0usize;
        while used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}.{suffix}");
        }
        used.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}
