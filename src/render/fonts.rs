//! Metrics and encoding of the two base-14 fonts used on chart pages.

use encoding_rs::WINDOWS_1252;

/// Advance widths in 1/1000 em of Helvetica for codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space to /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0 to ?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @ to O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P to _
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // ` to o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p to ~
];

/// Advance widths in 1/1000 em of Helvetica-Bold for codes 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space to /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0 to ?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @ to O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P to _
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // ` to o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p to ~
];

/// Width used for codes above 126, close to the average accented letter
const DEFAULT_WIDTH: u16 = 556;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name of the font in page dictionaries
    pub(crate) fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub(crate) fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn code_width(&self, code: u8) -> u16 {
        match code {
            32..=126 => self.widths()[(code - 32) as usize],
            _ => DEFAULT_WIDTH,
        }
    }

    /// Width in points of `text` set at `size`.
    pub(crate) fn measure(&self, text: &str, size: f64) -> f64 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|code| self.code_width(code) as u32)
            .sum();
        units as f64 * size / 1000.0
    }
}

/// Encodes text as WinAnsi bytes; characters outside Windows-1252 become `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buffer = [0u8; 4];
    for char in text.chars() {
        if char.is_control() {
            bytes.push(b' ');
            continue;
        }
        let (encoded, _, had_errors) = WINDOWS_1252.encode(char.encode_utf8(&mut buffer));
        match encoded.as_ref() {
            [byte] if !had_errors => bytes.push(*byte),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}

/// Splits `text` into lines no wider than `width`, breaking at spaces where possible.
pub(crate) fn wrap(text: &str, font: Font, size: f64, width: f64) -> Vec<String> {
    let mut lines = Vec::<String>::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };
            if line.is_empty() || font.measure(&candidate, size) <= width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_owned()));
            }
            while font.measure(&line, size) > width && line.chars().count() > 1 {
                let split = break_point(&line, font, size, width);
                let rest = line.split_off(split);
                lines.push(std::mem::replace(&mut line, rest));
            }
        }
        lines.push(line);
    }
    lines
}

/// Byte index of the longest prefix of `line` that fits, keeping at least one character.
fn break_point(line: &str, font: Font, size: f64, width: f64) -> usize {
    let mut fitting = None;
    for (index, _) in line.char_indices().skip(1) {
        if font.measure(&line[..index], size) > width {
            break;
        }
        fitting = Some(index);
    }
    fitting.or_else(|| line.char_indices().nth(1).map(|(index, _)| index)).unwrap_or(line.len())
}
