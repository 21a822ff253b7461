//! Microsoft Office Excel Helpers
use crate::error::RustyChartsError;
use crate::helpers::cfb::Cfb;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::Attributes;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Seek;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Opens an OOXML workbook archive and loads its sheet list and number formats
///
/// # Arguments
/// * `file_name` - Name used in error messages
/// * `reader` - Source of the workbook bytes
/// * `load_workbook` - Function to load workbook metadata and sheets
/// * `load_number_formats` - Function to load number formatting information
///
/// # Returns
/// Tuple containing:
/// - Zip archive handle
/// - Number format mappings
/// - List of sheet names and their paths
pub(super) fn open<W, F>(file_name: &str, mut reader: UnifiedReader, load_workbook: W, load_number_formats: F) -> Result<(
    ZipArchive<UnifiedReader>,
    Vec<CellType>,
    Vec<(String, String)>
), RustyChartsError>
where
    W: Fn(&mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, bool), RustyChartsError>,
    F: Fn(&mut ZipArchive<UnifiedReader>, bool) -> Result<Vec<CellType>, RustyChartsError>,
{
    if is_password_protected(&mut reader)? {
        Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
    }

    let mut zip = ZipArchive::new(reader)?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
    }

    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Loads worksheet relationships from an Excel file
///
/// # Returns
/// Mapping of relationship IDs to worksheet paths
pub(super) fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, RustyChartsError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let attributes = Attributes::of(&event)?;
            // Only process worksheet relationships
            if attributes.get("Type").map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = attributes.get("Id").zip(attributes.get("Target")) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps format indexes to cell types using custom and built-in formats
///
/// # Arguments
/// * `format_indexes` - Number format id of each cell style, in style order
/// * `custom_formats` - Custom format mappings defined in the workbook
/// * `is_1904` - Whether the workbook uses the 1904 date system
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Looks up the cell type of a style index, treating unknown styles as plain numbers
pub(super) fn number_format(number_formats: &[CellType], index: usize) -> CellType {
    number_formats.get(index).copied().unwrap_or(CellType::Number)
}

/// Normalizes a relationship target to a path inside the archive
pub(crate) fn to_zip_path(path: &str) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Encrypted OOXML files are OLE containers holding an `EncryptedPackage` stream
fn is_password_protected(reader: &mut UnifiedReader) -> Result<bool, RustyChartsError> {
    if !Cfb::is_cfb(reader)? {
        return Ok(false);
    }
    let is_encrypted = Cfb::new(reader)
        .map(|cfb| cfb.exists("EncryptedPackage"))
        .unwrap_or(false);
    reader.rewind()?;
    Ok(is_encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_relationship_targets() {
        assert_eq!(to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn maps_styles_to_cell_types() {
        let mut custom = HashMap::new();
        custom.insert("164".to_owned(), CellType::NumberDate1900);
        let formats = load_number_formats(
            vec!["0".to_owned(), "164".to_owned(), "14".to_owned(), "4".to_owned()],
            custom,
            false,
        );
        assert_eq!(formats, vec![CellType::Number, CellType::NumberDate1900, CellType::NumberDate1900, CellType::Number]);
        assert_eq!(number_format(&formats, 1), CellType::NumberDate1900);
        assert_eq!(number_format(&formats, 99), CellType::Number);
    }

    #[test]
    fn plain_bytes_are_not_encrypted() {
        let mut reader = UnifiedReader::from_bytes(b"PK\x03\x04 rest of archive".to_vec());
        assert!(!is_password_protected(&mut reader).unwrap());
    }
}
