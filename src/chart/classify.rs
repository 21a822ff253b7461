use crate::table::Table;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// Suffixes that mark a column as the uncertainty of another column, in probe order.
/// `Revenue_SD` holds the error bars of `Revenue`.
pub const ERROR_COLUMN_SUFFIXES: [&str; 3] = ["_Fehler", "_SD", "_Error"];

/// Source of the category axis labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum Category {
    /// Values of a non-numeric column
    Column(String),
    /// Zero-based row positions, used when every column is numeric
    RowIndex,
}

/// How the columns of one table map onto charts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    pub category: Category,
    /// Columns charted as series, in declared order
    pub numeric_columns: Vec<String>,
    /// Error column paired with a numeric column
    pub error_column_of: HashMap<String, String>,
}

impl ColumnClassification {
    pub fn error_column(&self, column: &str) -> Option<&str> {
        self.error_column_of.get(column).map(String::as_str)
    }
}

/// Picks the category column and the charted series of a table.
///
/// The category is the first non-numeric column, falling back to the row index.
/// Every other numeric column is a series unless it is the error column of
/// another series.
pub fn classify(table: &Table) -> ColumnClassification {
    let category = table
        .columns()
        .iter()
        .find(|column| !column.kind().is_numeric())
        .map(|column| Category::Column(column.name().to_owned()))
        .unwrap_or(Category::RowIndex);

    let candidates: Vec<&str> = table
        .columns()
        .iter()
        .filter(|column| column.kind().is_numeric())
        .map(|column| column.name())
        .collect();

    let mut error_column_of = HashMap::<String, String>::new();
    for name in &candidates {
        let error_column = ERROR_COLUMN_SUFFIXES
            .iter()
            .map(|suffix| format!("{name}{suffix}"))
            .find(|candidate| table.contains(candidate));
        if let Some(error_column) = error_column {
            error_column_of.insert((*name).to_owned(), error_column);
        }
    }

    let error_columns: HashSet<&str> = error_column_of.values().map(String::as_str).collect();
    let numeric_columns: Vec<String> = candidates
        .into_iter()
        .filter(|name| !error_columns.contains(name))
        .map(str::to_owned)
        .collect();
    error_column_of.retain(|name, _| numeric_columns.contains(name));

    ColumnClassification {
        category,
        numeric_columns,
        error_column_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn first_text_column_is_the_category() {
        let table = Table::new(vec![
            Column::numbers("Year", &[Some(2023.0), Some(2024.0)]),
            Column::texts("Region", &["North", "South"]),
            Column::texts("Owner", &["Ann", "Bob"]),
            Column::numbers("Revenue", &[Some(100.0), Some(80.0)]),
        ]);
        let classification = classify(&table);
        assert_eq!(classification.category, Category::Column("Region".to_owned()));
        assert_eq!(classification.numeric_columns, vec!["Year", "Revenue"]);
        assert!(classification.error_column_of.is_empty());
    }

    #[test]
    fn all_numeric_tables_use_the_row_index() {
        let table = Table::new(vec![
            Column::numbers("A", &[Some(1.0), Some(3.0)]),
            Column::numbers("B", &[Some(2.0), Some(4.0)]),
        ]);
        let classification = classify(&table);
        assert_eq!(classification.category, Category::RowIndex);
        assert_eq!(classification.numeric_columns, vec!["A", "B"]);
    }

    #[test]
    fn pairs_error_columns_by_suffix() {
        let table = Table::new(vec![
            Column::texts("Region", &["North", "South"]),
            Column::numbers("Revenue", &[Some(100.0), Some(80.0)]),
            Column::numbers("Revenue_SD", &[Some(5.0), Some(3.0)]),
            Column::numbers("Cost", &[Some(60.0), Some(50.0)]),
            Column::numbers("Cost_Error", &[Some(1.0), Some(2.0)]),
        ]);
        let classification = classify(&table);
        assert_eq!(classification.numeric_columns, vec!["Revenue", "Cost"]);
        assert_eq!(classification.error_column("Revenue"), Some("Revenue_SD"));
        assert_eq!(classification.error_column("Cost"), Some("Cost_Error"));
    }

    #[test]
    fn error_suffixes_are_probed_in_priority_order() {
        let table = Table::new(vec![
            Column::numbers("X", &[Some(1.0)]),
            Column::numbers("X_Error", &[Some(0.3)]),
            Column::numbers("X_SD", &[Some(0.2)]),
            Column::numbers("X_Fehler", &[Some(0.1)]),
        ]);
        let classification = classify(&table);
        assert_eq!(classification.error_column("X"), Some("X_Fehler"));
        // Unused candidates stay series of their own
        assert_eq!(classification.numeric_columns, vec!["X", "X_Error", "X_SD"]);
    }

    #[test]
    fn text_error_columns_are_still_paired() {
        let table = Table::new(vec![
            Column::texts("Region", &["North"]),
            Column::numbers("Revenue", &[Some(1.0)]),
            Column::texts("Revenue_SD", &["n/a"]),
        ]);
        let classification = classify(&table);
        assert_eq!(classification.numeric_columns, vec!["Revenue"]);
        assert_eq!(classification.error_column("Revenue"), Some("Revenue_SD"));
    }

    #[test]
    fn category_is_never_a_series() {
        let table = Table::new(vec![
            Column::texts("Label", &["a", "b"]),
            Column::numbers("Value", &[Some(1.0), None]),
        ]);
        let classification = classify(&table);
        assert!(!classification.numeric_columns.contains(&"Label".to_owned()));
    }
}
