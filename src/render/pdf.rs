//! Minimal PDF 1.4 writer: uncompressed content streams and the two base-14
//! Helvetica faces, which is all a chart page needs.

use crate::chart::Color;
use crate::render::fonts::encode_win_ansi;
use crate::render::fonts::Font;
use std::fmt::Write as _;

/// Object numbers of the fixed objects; pages follow from `FIRST_PAGE`
const CATALOG: usize = 1;
const PAGES: usize = 2;
const FONT_REGULAR: usize = 3;
const FONT_BOLD: usize = 4;
const FIRST_PAGE: usize = 5;

/// One page: its size in points and its drawing operators.
pub(crate) struct PdfPage {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) content: Content,
}

/// Builder for a page content stream.
#[derive(Default)]
pub(crate) struct Content {
    operators: String,
}

impl Content {
    pub(crate) fn new() -> Content {
        Content::default()
    }

    fn push(&mut self, operator: &str, operands: &[f64]) {
        for operand in operands {
            self.operators.push_str(&number(*operand));
            self.operators.push(' ');
        }
        self.operators.push_str(operator);
        self.operators.push('\n');
    }

    pub(crate) fn save(&mut self) {
        self.push("q", &[]);
    }

    pub(crate) fn restore(&mut self) {
        self.push("Q", &[]);
    }

    pub(crate) fn fill_color(&mut self, color: Color) {
        let (r, g, b) = color.to_unit();
        self.push("rg", &[r, g, b]);
    }

    pub(crate) fn stroke_color(&mut self, color: Color) {
        let (r, g, b) = color.to_unit();
        self.push("RG", &[r, g, b]);
    }

    pub(crate) fn line_width(&mut self, width: f64) {
        self.push("w", &[width]);
    }

    /// Strokes a straight segment.
    pub(crate) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.push("m", &[x1, y1]);
        self.push("l", &[x2, y2]);
        self.push("S", &[]);
    }

    pub(crate) fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push("re", &[x, y, width, height]);
        self.push("f", &[]);
    }

    /// Intersects the clipping path with a rectangle until the next `restore`.
    pub(crate) fn clip_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push("re", &[x, y, width, height]);
        self.push("W", &[]);
        self.push("n", &[]);
    }

    /// Draws `text` with its baseline starting at (`x`, `y`).
    pub(crate) fn text(&mut self, font: Font, size: f64, x: f64, y: f64, text: &str) {
        self.push("BT", &[]);
        let _ = writeln!(self.operators, "/{} {} Tf", font.resource(), number(size));
        self.push("Td", &[x, y]);
        self.operators.push_str(&literal(&encode_win_ansi(text)));
        self.operators.push_str(" Tj\n");
        self.push("ET", &[]);
    }

    fn into_bytes(self) -> Vec<u8> {
        self.operators.into_bytes()
    }
}

/// Formats a number with at most three decimals and no trailing zeros.
fn number(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_owned(),
        text => text.to_owned(),
    }
}

/// PDF literal string; bytes outside printable ASCII are written as octal escapes.
fn literal(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() + 2);
    text.push('(');
    for byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                text.push('\\');
                text.push(*byte as char);
            }
            32..=126 => text.push(*byte as char),
            _ => {
                let _ = write!(text, "\\{byte:03o}");
            }
        }
    }
    text.push(')');
    text
}

/// Serializes the pages into a complete PDF file.
pub(crate) fn write_pdf(pages: Vec<PdfPage>) -> Vec<u8> {
    let mut writer = ObjectWriter::new();
    let kids: Vec<String> = (0..pages.len())
        .map(|index| format!("{} 0 R", FIRST_PAGE + 2 * index))
        .collect();

    writer.object(CATALOG, format!("<< /Type /Catalog /Pages {PAGES} 0 R >>").as_bytes());
    writer.object(
        PAGES,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()).as_bytes(),
    );
    for (id, font) in [(FONT_REGULAR, Font::Regular), (FONT_BOLD, Font::Bold)] {
        writer.object(
            id,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_font()
            )
            .as_bytes(),
        );
    }

    for (index, page) in pages.into_iter().enumerate() {
        let page_id = FIRST_PAGE + 2 * index;
        let content_id = page_id + 1;
        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /{} {FONT_REGULAR} 0 R /{} {FONT_BOLD} 0 R >> >> \
                 /Contents {content_id} 0 R >>",
                number(page.width),
                number(page.height),
                Font::Regular.resource(),
                Font::Bold.resource(),
            )
            .as_bytes(),
        );
        writer.stream(content_id, page.content.into_bytes());
    }
    writer.finish(CATALOG)
}

/// Appends numbered objects and keeps their byte offsets for the xref table.
struct ObjectWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new() -> ObjectWriter {
        let mut buffer = b"%PDF-1.4\n".to_vec();
        // Binary marker so transfer tools keep the file 8-bit clean
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        ObjectWriter {
            buffer,
            offsets: Vec::new(),
        }
    }

    fn begin(&mut self, id: usize) {
        if self.offsets.len() < id {
            self.offsets.resize(id, 0);
        }
        self.offsets[id - 1] = self.buffer.len();
        self.buffer.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.begin(id);
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, data: Vec<u8>) {
        self.begin(id);
        self.buffer.extend_from_slice(format!("<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.buffer.extend_from_slice(&data);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        let xref = self.buffer.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            let _ = write!(table, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root {root} 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            self.offsets.len() + 1
        );
        self.buffer.extend_from_slice(table.as_bytes());
        self.buffer
    }
}
