use crate::chart::classify::Category;
use crate::chart::classify::ColumnClassification;
use crate::chart::palette::Palette;
use crate::chart::spec::ChartSpec;
use crate::chart::spec::Legend;
use crate::chart::spec::YRange;
use crate::chart::style::ChartStyle;
use crate::table::Column;
use crate::table::Table;
use crate::table::Value;
use log::debug;
use thiserror::Error;

/// Reasons a series cannot be charted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Column '{0}' has {2} values for {1} categories")]
    Misaligned(String, usize, usize),

    #[error("Error column '{1}' of '{0}' is not numeric")]
    NonNumericErrorColumn(String, String),

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

/// Builds one chart per numeric column of a classified table, in column order.
///
/// The first series that cannot be charted fails the whole table.
pub fn build(
    sheet: &str,
    table: &Table,
    classification: &ColumnClassification,
    palette: Palette,
    style: &ChartStyle,
) -> Result<Vec<ChartSpec>, BuildError> {
    let categories = categories(table, &classification.category)?;
    let colors: Vec<_> = (0..categories.len()).map(|index| palette.color(index)).collect();

    let mut charts = Vec::<ChartSpec>::with_capacity(classification.numeric_columns.len());
    for name in &classification.numeric_columns {
        let column = find_column(table, name)?;
        let values = aligned_numbers(column, categories.len())?;

        let errors = match classification.error_column(name) {
            Some(error_name) => {
                let error_column = find_column(table, error_name)?;
                if !error_column.kind().is_numeric() {
                    return Err(BuildError::NonNumericErrorColumn(name.to_owned(), error_name.to_owned()));
                }
                Some(aligned_numbers(error_column, values.len())?)
            }
            None => None,
        };

        debug!(
            "chart '{}' / '{}': {} categories{}",
            sheet,
            name,
            categories.len(),
            if errors.is_some() { ", with error bars" } else { "" },
        );
        charts.push(ChartSpec {
            title: format!("{sheet} \u{2013} {name}"),
            sheet: sheet.to_owned(),
            series: name.to_owned(),
            y_range: YRange::headroom(&values),
            legend: Legend::below(categories.clone()),
            categories: categories.clone(),
            values,
            errors,
            colors: colors.clone(),
            style: style.clone(),
        });
    }
    Ok(charts)
}

/// Category labels in row order; missing cells become empty labels.
fn categories(table: &Table, category: &Category) -> Result<Vec<String>, BuildError> {
    match category {
        Category::Column(name) => Ok(find_column(table, name)?
            .values()
            .iter()
            .map(Value::to_string)
            .collect()),
        Category::RowIndex => Ok((0..table.row_count()).map(|row| row.to_string()).collect()),
    }
}

fn find_column<'a>(table: &'a Table, name: &str) -> Result<&'a Column, BuildError> {
    table.column(name).ok_or_else(|| BuildError::MissingColumn(name.to_owned()))
}

fn aligned_numbers(column: &Column, expected: usize) -> Result<Vec<Option<f64>>, BuildError> {
    if column.len() != expected {
        return Err(BuildError::Misaligned(column.name().to_owned(), expected, column.len()));
    }
    Ok(column.values().iter().map(Value::as_number).collect())
}
