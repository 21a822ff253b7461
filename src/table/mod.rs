//! In-memory workbook model: named sheets, each an ordered list of typed columns.

mod column;

pub use column::Column;
pub use column::ColumnKind;
pub use column::Value;

/// An ordered sequence of named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Table {
        Table { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Finds a column by its exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Length of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }

    /// A table with no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns true if the columns differ in length.
    pub fn is_ragged(&self) -> bool {
        let row_count = self.row_count();
        self.columns.iter().any(|column| column.len() != row_count)
    }
}

/// Sheets of a workbook in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<(String, Table)>,
}

impl Workbook {
    pub fn new() -> Workbook {
        Workbook::default()
    }

    pub fn push<S: Into<String>>(&mut self, name: S, table: Table) {
        self.sheets.push((name.into(), table));
    }

    /// Builder-style variant of [`Workbook::push`].
    pub fn with_sheet<S: Into<String>>(mut self, name: S, table: Table) -> Workbook {
        self.push(name, table);
        self
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.sheets.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|(sheet, _)| sheet == name).map(|(_, table)| table)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
