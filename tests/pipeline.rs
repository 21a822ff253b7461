use rusty_charts::chart::ChartStyle;
use rusty_charts::chart::Palette;
use rusty_charts::document::PageSpec;
use rusty_charts::document::SheetFilter;
use rusty_charts::render::Paginator;
use rusty_charts::render::PdfPaginator;
use rusty_charts::render::PlanWriter;
use rusty_charts::table::ColumnKind;
use rusty_charts::table::Value;
use rusty_charts::SpreadsheetFormat;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const WORKSHEET_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Builds a minimal workbook from (sheet name, sheetData XML) pairs.
fn xlsx(sheets: &[(&str, &str)], shared_strings: &[&str]) -> Vec<u8> {
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut relationships = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships>"#);
    for (index, (name, _)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="{WORKSHEET_TYPE}" Target="worksheets/sheet{id}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    let mut strings = format!(r#"<?xml version="1.0" encoding="UTF-8"?><sst count="{0}" uniqueCount="{0}">"#, shared_strings.len());
    for string in shared_strings {
        strings.push_str(&format!("<si><t>{string}</t></si>"));
    }
    strings.push_str("</sst>");

    let styles = r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;

    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut add = |name: &str, content: &str| {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    };
    add("xl/workbook.xml", &workbook);
    add("xl/_rels/workbook.xml.rels", &relationships);
    add("xl/sharedStrings.xml", &strings);
    add("xl/styles.xml", styles);
    for (index, (_, data)) in sheets.iter().enumerate() {
        add(
            &format!("xl/worksheets/sheet{}.xml", index + 1),
            &format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet><sheetData>{data}</sheetData></worksheet>"#),
        );
    }
    writer.finish().unwrap().into_inner()
}

/// Q1 has an error column, Empty has no cells, Data is all numeric,
/// Bad pairs a series with a text error column, Days has a date category.
fn quarterly_report() -> Vec<u8> {
    let q1 = r#"
        <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
        <row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2"><v>100</v></c><c r="C2"><v>5</v></c></row>
        <row r="3"><c r="A3" t="s"><v>4</v></c><c r="B3"><v>80</v></c><c r="C3"><v>3</v></c></row>"#;
    let data = r#"
        <row r="1"><c r="A1" t="inlineStr"><is><t>A</t></is></c><c r="B1" t="inlineStr"><is><t>B</t></is></c></row>
        <row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>2</v></c></row>
        <row r="3"><c r="A3"><v>3</v></c><c r="B3"><v>4</v></c></row>"#;
    let bad = r#"
        <row r="1"><c r="A1" t="inlineStr"><is><t>V</t></is></c><c r="B1" t="inlineStr"><is><t>V_SD</t></is></c></row>
        <row r="2"><c r="A2"><v>1</v></c><c r="B2" t="inlineStr"><is><t>n/a</t></is></c></row>"#;
    let days = r#"
        <row r="2"><c r="B2" t="inlineStr"><is><t>Day</t></is></c><c r="C2" t="inlineStr"><is><t>Open</t></is></c><c r="D2" t="inlineStr"><is><t>Visits</t></is></c></row>
        <row r="3"><c r="B3" s="1"><v>45292</v></c><c r="C3" t="b"><v>1</v></c><c r="D3"><v>12.5</v></c></row>
        <row r="4"><c r="B4" s="1"><v>45293</v></c><c r="C4" t="b"><v>0</v></c></row>"#;
    xlsx(
        &[("Q1", q1), ("Empty", ""), ("Data", data), ("Bad", bad), ("Days", days)],
        &["Region", "Revenue", "Revenue_SD", "North", "South"],
    )
}

fn write_fixture(directory: &Path) -> PathBuf {
    let path = directory.join("report.xlsx");
    fs::write(&path, quarterly_report()).unwrap();
    path
}

fn pdf_page_count(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.split("/Type /Pages /Kids")
        .nth(1)
        .and_then(|tail| tail.split("/Count ").nth(1))
        .and_then(|tail| tail.split(' ').next())
        .and_then(|count| count.parse().ok())
        .unwrap()
}

#[test]
fn decodes_workbook_tables() {
    let workbook = rusty_charts::read_workbook("report.xlsx", quarterly_report(), SpreadsheetFormat::Xlsx).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Q1", "Empty", "Data", "Bad", "Days"]);

    let q1 = workbook.table("Q1").unwrap();
    assert_eq!(q1.column("Region").unwrap().values(), &[Value::text("North"), Value::text("South")]);
    assert_eq!(q1.column("Revenue_SD").unwrap().values(), &[Value::Number(5.0), Value::Number(3.0)]);

    assert!(workbook.table("Empty").unwrap().is_empty());

    let days = workbook.table("Days").unwrap();
    let day = days.column("Day").unwrap();
    assert_eq!(day.kind(), ColumnKind::Text);
    assert_eq!(day.values(), &[Value::text("2024-01-01"), Value::text("2024-01-02")]);
    let open = days.column("Open").unwrap();
    assert_eq!(open.kind(), ColumnKind::Numeric);
    assert_eq!(open.values(), &[Value::Number(1.0), Value::Number(0.0)]);
    assert_eq!(days.column("Visits").unwrap().values(), &[Value::Number(12.5), Value::Empty]);
}

#[test]
fn renders_every_sheet_into_one_pdf() {
    let directory = tempfile::tempdir().unwrap();
    let workbook = rusty_charts::open_workbook(write_fixture(directory.path())).unwrap();
    let document = rusty_charts::assemble(&workbook, Palette::BlueGrey, &ChartStyle::default());

    let titles: Vec<String> = document
        .pages
        .iter()
        .map(|page| match page {
            PageSpec::Chart(chart) => chart.title.to_owned(),
            PageSpec::Error(error) => format!("error: {}", error.subject),
        })
        .collect();
    assert_eq!(
        titles,
        vec!["Q1 – Revenue", "Data – A", "Data – B", "error: Bad", "Days – Open", "Days – Visits"],
    );

    let PageSpec::Chart(revenue) = &document.pages[0] else {
        panic!("expected a chart page");
    };
    assert_eq!(revenue.categories, vec!["North", "South"]);
    assert_eq!(revenue.values, vec![Some(100.0), Some(80.0)]);
    assert_eq!(revenue.errors, Some(vec![Some(5.0), Some(3.0)]));
    assert_eq!(revenue.y_range.max, 120.0);

    let PageSpec::Chart(index) = &document.pages[1] else {
        panic!("expected a chart page");
    };
    assert_eq!(index.categories, vec!["0", "1"]);

    let pdf = PdfPaginator::default().paginate(&document).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(pdf.ends_with(b"%%EOF\n"));
    assert_eq!(pdf_page_count(&pdf), document.pages.len());
}

#[test]
fn filters_sheets_by_name() {
    let workbook = rusty_charts::read_workbook("report.xlsx", quarterly_report(), SpreadsheetFormat::Xlsx).unwrap();
    let filter = SheetFilter::new(&["Q*", "D?ta"]).unwrap();
    let document = rusty_charts::assemble_filtered(&workbook, Palette::PurpleBerry, &ChartStyle::default(), &filter);
    assert_eq!(document.chart_count(), 3);
    assert_eq!(document.error_count(), 0);
}

#[test]
fn writes_the_plan_as_json() {
    let directory = tempfile::tempdir().unwrap();
    let workbook = rusty_charts::open_workbook(write_fixture(directory.path())).unwrap();
    let document = rusty_charts::assemble(&workbook, Palette::GreenTurquoise, &ChartStyle::default());
    let path = directory.path().join("plan.json");
    PlanWriter.write_to(&document, &path).unwrap();

    let plan: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let pages = plan["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 6);
    assert_eq!(pages[0]["title"], "Q1 – Revenue");
    assert_eq!(pages[0]["colors"][0], "#006400");
    assert_eq!(pages[3]["kind"], "error");
    assert_eq!(pages[3]["message"], "Error column 'V_SD' of 'V' is not numeric");
}

#[test]
fn command_line_run() {
    let directory = tempfile::tempdir().unwrap();
    let input = write_fixture(directory.path());
    let output = directory.path().join("out.pdf");
    let plan = directory.path().join("plan.json");

    let result = Command::new(env!("CARGO_BIN_EXE_rusty-charts"))
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--plan")
        .arg(&plan)
        .args(["--palette", "orange-grey", "--sheet", "Q1"])
        .output()
        .unwrap();
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(pdf_page_count(&fs::read(&output).unwrap()), 1);
    assert!(fs::read_to_string(&plan).unwrap().contains("#E46C0A"));
}

#[test]
fn command_line_lists_sheets() {
    let directory = tempfile::tempdir().unwrap();
    let input = write_fixture(directory.path());
    let result = Command::new(env!("CARGO_BIN_EXE_rusty-charts"))
        .arg(&input)
        .arg("--list-sheets")
        .output()
        .unwrap();
    assert!(result.status.success());
    assert_eq!(String::from_utf8_lossy(&result.stdout), "Q1\nEmpty\nData\nBad\nDays\n");
}

#[test]
fn unreadable_input_fails_without_output() {
    let directory = tempfile::tempdir().unwrap();
    let input = directory.path().join("broken.xlsx");
    fs::write(&input, b"not a workbook").unwrap();
    let output = directory.path().join("charts.pdf");

    let result = Command::new(env!("CARGO_BIN_EXE_rusty-charts"))
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).starts_with("Error: "));
    assert!(!output.exists());
}
