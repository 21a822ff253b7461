use crate::chart::ChartStyle;
use crate::chart::Palette;
use crate::document::filter::SheetFilter;
use crate::document::page::PageSpec;
use crate::document::sheet::render;
use crate::table::Workbook;
use log::debug;
use log::info;
use serde::Deserialize;
use serde::Serialize;

/// The ordered pages of one output document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<PageSpec>,
}

impl Document {
    pub fn chart_count(&self) -> usize {
        self.pages.iter().filter(|page| !page.is_error()).count()
    }

    pub fn error_count(&self) -> usize {
        self.pages.iter().filter(|page| page.is_error()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Pages of every sheet in workbook order.
pub fn assemble(workbook: &Workbook, palette: Palette, style: &ChartStyle) -> Document {
    assemble_filtered(workbook, palette, style, &SheetFilter::default())
}

/// Pages of the sheets accepted by `filter`, in workbook order.
pub fn assemble_filtered(workbook: &Workbook, palette: Palette, style: &ChartStyle, filter: &SheetFilter) -> Document {
    let mut pages = Vec::<PageSpec>::new();
    for (sheet, table) in workbook.sheets() {
        if !filter.accept(sheet) {
            debug!("sheet '{}' skipped by filter", sheet);
            continue;
        }
        pages.extend(render(sheet, table, palette, style));
    }
    let document = Document { pages };
    info!(
        "{} chart pages, {} error pages from {} sheets",
        document.chart_count(),
        document.error_count(),
        workbook.len(),
    );
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::table::Table;

    fn workbook() -> Workbook {
        Workbook::new()
            .with_sheet(
                "Q1",
                Table::new(vec![
                    Column::texts("Region", &["North", "South"]),
                    Column::numbers("Revenue", &[Some(100.0), Some(80.0)]),
                    Column::numbers("Revenue_SD", &[Some(5.0), Some(3.0)]),
                ]),
            )
            .with_sheet("Empty", Table::default())
            .with_sheet(
                "Broken",
                Table::new(vec![
                    Column::numbers("A", &[Some(1.0), Some(2.0)]),
                    Column::numbers("B", &[Some(1.0)]),
                ]),
            )
            .with_sheet(
                "Q2",
                Table::new(vec![
                    Column::numbers("A", &[Some(1.0), Some(3.0)]),
                    Column::numbers("B", &[Some(2.0), Some(4.0)]),
                ]),
            )
    }

    fn titles(document: &Document) -> Vec<String> {
        document
            .pages
            .iter()
            .map(|page| match page {
                PageSpec::Chart(chart) => chart.title.to_owned(),
                PageSpec::Error(error) => format!("error: {}", error.subject),
            })
            .collect()
    }

    #[test]
    fn pages_follow_sheet_order() {
        let document = assemble(&workbook(), Palette::BlueGrey, &ChartStyle::default());
        assert_eq!(titles(&document), vec!["Q1 – Revenue", "error: Broken", "Q2 – A", "Q2 – B"]);
        assert_eq!(document.chart_count(), 3);
        assert_eq!(document.error_count(), 1);
    }

    #[test]
    fn filtered_sheets_contribute_nothing() {
        let filter = SheetFilter::new(&["Q*"]).unwrap();
        let document = assemble_filtered(&workbook(), Palette::BlueGrey, &ChartStyle::default(), &filter);
        assert_eq!(titles(&document), vec!["Q1 – Revenue", "Q2 – A", "Q2 – B"]);
        assert_eq!(document.error_count(), 0);
    }

    #[test]
    fn empty_workbooks_make_empty_documents() {
        let document = assemble(&Workbook::new(), Palette::GreenTurquoise, &ChartStyle::default());
        assert!(document.is_empty());
    }

    #[test]
    fn plan_pages_are_tagged_by_kind() {
        let document = assemble(&workbook(), Palette::BlueGrey, &ChartStyle::default());
        let json = serde_json::to_value(&document).unwrap();
        let kinds: Vec<&str> = json["pages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|page| page["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["chart", "error", "chart", "chart"]);
        assert_eq!(json["pages"][0]["errors"], serde_json::json!([5.0, 3.0]));
        assert_eq!(json["pages"][0]["colors"][0], "#002060");
        assert_eq!(json["pages"][1]["subject"], "Broken");
    }
}
