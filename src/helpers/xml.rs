//! Streaming access to the XML parts of an OOXML workbook: worksheets,
//! shared strings, styles and relationship lists.

use crate::error::RustyChartsError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Runs the given arms over every event of an [`XmlReader`] until the end of the part.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

const TAG_TEXT: QName = QName(b"t");
const TAG_PHONETIC_RUN: QName = QName(b"rPh");

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown entity '&{0};'")]
    ParseEntityError(String),

    #[error("Attribute {0}=\"{1}\" has an unexpected value")]
    ParseAttributeValueError(String, String),
}

pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event of the part, `None` at its end.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, RustyChartsError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }

    /// Collects the string inside the current element, stopping at `end`.
    ///
    /// Rich text runs are concatenated and phonetic runs (`<rPh>`) are dropped.
    /// `<v>` holds its text directly; `<si>` and `<is>` wrap it in `<t>` elements,
    /// so `is_text_content` says whether text counts before any `<t>` is seen.
    pub(crate) fn read_text(&mut self, end: QName, is_text_content: bool) -> Result<String, RustyChartsError> {
        let mut is_phonetic_run = false;
        let mut is_text = is_text_content;
        let mut text = String::new();
        match_xml_events!(self => {
            Event::End(event) if event.name() == end => break,
            Event::Start(event) if event.name() == TAG_PHONETIC_RUN => is_phonetic_run = true,
            Event::End(event) if event.name() == TAG_PHONETIC_RUN => is_phonetic_run = false,
            Event::Start(event) if !is_phonetic_run && event.name() == TAG_TEXT => is_text = true,
            Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
            Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
            Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
            Event::GeneralRef(event) if is_text => push_reference(&mut text, &event)?,
        });
        Ok(text)
    }
}

/// Appends an entity (`&amp;`) or a character reference (`&#65;`, `&#x41;`).
fn push_reference(text: &mut String, reference: &BytesRef) -> Result<(), RustyChartsError> {
    let raw = reference.xml_content()?;
    if let Some(number) = raw.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16)?,
            None => number.parse::<u32>()?,
        };
        text.extend(char::from_u32(code));
    } else {
        let entity = resolve_xml_entity(&raw).ok_or_else(|| XmlError::ParseEntityError(raw.to_string()))?;
        text.push_str(entity);
    }
    Ok(())
}

/// Unescaped attributes of a start tag, looked up by local name so that
/// `r:id` on a `<sheet>` is found as `id`.
pub(crate) struct Attributes {
    values: Vec<(String, String)>,
}

impl Attributes {
    pub(crate) fn of(event: &BytesStart) -> Result<Attributes, RustyChartsError> {
        let mut values = Vec::new();
        for attribute in event.attributes() {
            let attribute = attribute?;
            let key = attribute.key.local_name();
            let name = std::str::from_utf8(key.as_ref())?.to_owned();
            values.push((name, attribute.unescape_value()?.into_owned()));
        }
        Ok(Attributes { values })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, RustyChartsError> {
        self.get(name)
            .map(|value| {
                value.trim().parse::<T>().map_err(|_| {
                    RustyChartsError::from(XmlError::ParseAttributeValueError(name.to_owned(), value.to_owned()))
                })
            })
            .transpose()
    }

    /// OOXML booleans are written `1`/`0` or `true`/`false`; a missing flag is false.
    pub(crate) fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some("1" | "true"))
    }
}

/// The attributes of a worksheet `<c>` element that decide where a cell goes and how its value reads.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CellAttributes {
    /// A1-style position (`r`)
    pub(crate) reference: Option<String>,
    /// Index into the cell formats of styles.xml (`s`)
    pub(crate) style: Option<usize>,
    /// Value type (`t`); absent means a number
    pub(crate) data_type: Option<String>,
}

impl CellAttributes {
    pub(crate) fn of(event: &BytesStart) -> Result<CellAttributes, RustyChartsError> {
        let mut attributes = Attributes::of(event)?;
        let style = attributes.parse("s")?;
        let mut take = |name: &str| {
            let index = attributes.values.iter().position(|(key, _)| key == name)?;
            Some(attributes.values.swap_remove(index).1)
        };
        Ok(CellAttributes {
            reference: take("r"),
            data_type: take("t"),
            style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_CELL: QName = QName(b"c");
    const TAG_VALUE: QName = QName(b"v");
    const TAG_SHARED_STRING_ITEM: QName = QName(b"si");

    fn first_start<T>(xml: &str, read: impl Fn(&BytesStart) -> Result<T, RustyChartsError>) -> T {
        let mut reader = XmlReader::new(xml.as_bytes());
        while let Some(event) = reader.next().unwrap() {
            if let Event::Start(event) = event {
                return read(&event).unwrap();
            }
        }
        panic!("no start tag in {xml}");
    }

    #[test]
    fn reads_cell_attributes() {
        let cell = first_start(r#"<c r="B2" s="3" t="s"><v>0</v></c>"#, CellAttributes::of);
        assert_eq!(cell.reference.as_deref(), Some("B2"));
        assert_eq!(cell.style, Some(3));
        assert_eq!(cell.data_type.as_deref(), Some("s"));

        let bare = first_start("<c><v>1</v></c>", CellAttributes::of);
        assert_eq!(bare, CellAttributes::default());
    }

    #[test]
    fn rejects_non_numeric_styles() {
        let mut reader = XmlReader::new(r#"<c s="bold"/>"#.as_bytes());
        let Some(Event::Start(event)) = reader.next().unwrap() else {
            panic!("expected a start tag");
        };
        let error = CellAttributes::of(&event).unwrap_err();
        assert!(matches!(
            error,
            RustyChartsError::XmlHelperError(XmlError::ParseAttributeValueError(ref name, ref value))
                if name == "s" && value == "bold"
        ));
    }

    #[test]
    fn finds_prefixed_attributes_by_local_name() {
        let xml = r#"<sheet xmlns:r="urn:r" name="Q&amp;A" sheetId="7" r:id="rId3" hidden="true"/>"#;
        let attributes = first_start(xml, Attributes::of);
        assert_eq!(attributes.get("name"), Some("Q&A"));
        assert_eq!(attributes.get("id"), Some("rId3"));
        assert_eq!(attributes.parse::<u32>("sheetId").unwrap(), Some(7));
        assert!(attributes.flag("hidden"));
        assert!(!attributes.flag("date1904"));
    }

    #[test]
    fn reads_values_with_references() -> Result<(), RustyChartsError> {
        let mut reader = XmlReader::new("<c><v>a &amp; b &#x41;&#66;</v></c>".as_bytes());
        let mut value = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = Some(reader.read_text(TAG_VALUE, true)?);
            }
            Event::End(event) if event.name() == TAG_CELL => break,
        });
        assert_eq!(value.as_deref(), Some("a & b AB"));
        Ok(())
    }

    #[test]
    fn joins_rich_text_and_drops_phonetic_runs() -> Result<(), RustyChartsError> {
        let xml = "<si><r><t>Ku</t></r><r><t xml:space=\"preserve\">ro </t></r>\
                   <rPh sb=\"0\" eb=\"1\"><t>kuro</t></rPh><t><![CDATA[<neko>]]></t></si>";
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                text = Some(reader.read_text(TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        assert_eq!(text.as_deref(), Some("Kuro <neko>"));
        Ok(())
    }

    #[test]
    fn rejects_unknown_entities() {
        let mut reader = XmlReader::new("<v>&bogus;</v>".as_bytes());
        let Some(Event::Start(_)) = reader.next().unwrap() else {
            panic!("expected a start tag");
        };
        let error = reader.read_text(TAG_VALUE, true).unwrap_err();
        assert!(matches!(error, RustyChartsError::XmlHelperError(XmlError::ParseEntityError(ref name)) if name == "bogus"));
    }
}
