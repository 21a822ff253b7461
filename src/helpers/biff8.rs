//! Record reader for the BIFF8 workbook stream of Excel 97-2003 (.xls) files.
//! Records split across CONTINUE records are read as one logical record.

use crate::error::RustyChartsError;
use crate::helpers::bytes::to_f64;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u32;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use encoding_rs::Encoding;
use thiserror::Error;

const CONTINUE: u16 = 60;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining")]
    NoEnoughDataError(usize),
}

/// Reader for BIFF8 (Excel 97-2003) binary format
/// Handles the record-based structure with continuation records
pub(crate) struct Biff8Reader {
    /// Code page for 8-bit strings; UTF-16LE means plain Latin-1 compression
    pub(crate) encoding: &'static Encoding,
    buffer: Vec<u8>,
    pointer: usize, // Next read position in buffer
    chunks: Vec<(usize, usize)>, // Current record chunks (start, end)
    index: usize,  // Current chunk index
    offset: usize, // Offset within current chunk
}

impl Biff8Reader {
    /// Creates a new BIFF8 reader with the given data buffer
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: &encoding_rs::UTF_16LE,
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    /// Reads the next record type and prepares for reading record data
    /// Returns None when no more records are available
    pub(crate) fn next(&mut self) -> Result<Option<u16>, RustyChartsError> {
        if self.pointer + 4 <= self.buffer.len() {
            self.index = 0;
            self.offset = 0;

            let kind = self.get_u16_at(self.pointer)?;
            let size = self.get_u16_at(self.pointer + 2)? as usize;
            let mut lower = self.pointer + 4;
            let mut upper = self.buffer.len().min(lower + size);
            self.pointer = upper;

            self.chunks.clear();
            self.chunks.push((lower, upper));
            while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
                let size = self.get_u16_at(self.pointer + 2)? as usize;
                lower = self.pointer + 4;
                upper = self.buffer.len().min(lower + size);
                self.pointer = upper;
                self.chunks.push((lower, upper));
            }

            Ok(Some(kind))
        } else {
            Ok(None)
        }
    }

    /// Moves to an absolute stream offset, such as a sheet's BOF position
    pub(crate) fn goto(&mut self, pointer: usize) {
        self.pointer = pointer.min(self.buffer.len());
        self.chunks.clear();
    }

    /// Reads exactly `length` bytes, returning an error if insufficient data
    fn read_extract(&mut self, length: usize) -> Result<&[u8], RustyChartsError> {
        let (data, size) = self.read(length);
        if size == length {
            Ok(data)
        } else {
            Err(Biff8Error::NoEnoughDataError(length))?
        }
    }

    /// Reads up to `length` bytes from the current record
    /// Returns the data slice and actual number of bytes read
    fn read(&mut self, length: usize) -> (&[u8], usize) {
        if let Some((lower, upper)) = self.chunks.get(self.index) {
            let source = (*upper).min(*lower + self.offset);
            let target = (*upper).min(source + length);
            let size = target - source;
            if source < *upper {
                if target == *upper {
                    self.index += 1;
                    self.offset = 0;
                } else {
                    self.offset += size;
                }
                return (&self.buffer[source..target], size);
            }
        }
        (&[], 0)
    }

    /// Skips `length` bytes and returns the skipped data
    pub(crate) fn skip(&mut self, length: usize) -> Result<&[u8], RustyChartsError> {
        self.read_extract(length)
    }

    /// Reads a single byte
    pub(crate) fn read_u8(&mut self) -> Result<u8, RustyChartsError> {
        self.read_extract(1).map(|data| data[0])
    }

    /// Reads a 16-bit unsigned integer
    pub(crate) fn read_u16(&mut self) -> Result<u16, RustyChartsError> {
        self.read_extract(2).map(to_u16)
    }

    /// Gets a 16-bit unsigned integer from the specified offset from the end
    pub(crate) fn get_u16_back(&self, offset: usize) -> Result<u16, RustyChartsError> {
        let mut offset = offset;
        for (lower, upper) in self.chunks.iter().rev() {
            if *lower + offset < *upper {
                let index = *upper - offset;
                return self.get_u16_at(index);
            } else {
                offset -= *upper - *lower;
            }
        }
        Err(Biff8Error::NoEnoughDataError(2))?
    }

    /// Gets a 16-bit unsigned integer from the specified absolute position
    pub(crate) fn get_u16_at(&self, index: usize) -> Result<u16, RustyChartsError> {
        if index + 2 <= self.buffer.len() {
            Ok(to_u16(&self.buffer[index..index + 2]))
        } else {
            Err(Biff8Error::NoEnoughDataError(2))?
        }
    }

    /// Reads a 32-bit unsigned integer
    pub(crate) fn read_u32(&mut self) -> Result<u32, RustyChartsError> {
        self.read_extract(4).map(to_u32)
    }

    /// Reads a usize value
    pub(crate) fn read_usize(&mut self) -> Result<usize, RustyChartsError> {
        self.read_extract(4).map(to_usize)
    }

    /// Reads a 64-bit unsigned integer
    pub(crate) fn read_u64(&mut self) -> Result<u64, RustyChartsError> {
        self.read_extract(8).map(to_u64)
    }

    /// Reads a 64-bit floating point number
    pub(crate) fn read_f64(&mut self) -> Result<f64, RustyChartsError> {
        self.read_extract(8).map(to_f64)
    }

    /// Reads an RK number, the packed integer-or-float encoding used by RK and MULRK cells
    pub(crate) fn read_rk_number(&mut self) -> Result<f64, RustyChartsError> {
        Ok(decode_rk_number(self.read_u32()?))
    }

    /// Reads a short Unicode string (1-byte length prefix)
    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, RustyChartsError> {
        let chars = self.read_u8()? as usize;
        self.read_string(chars, false)
    }

    /// Reads a Unicode string (2-byte length prefix)
    pub(crate) fn read_xl_unicode_string(&mut self) -> Result<String, RustyChartsError> {
        let chars = self.read_u16()? as usize;
        self.read_string(chars, false)
    }

    /// Reads a rich extended Unicode string, dropping its formatting runs and phonetic block
    pub(crate) fn read_xl_unicode_rich_extended_string(&mut self) -> Result<String, RustyChartsError> {
        let chars = self.read_u16()? as usize;
        self.read_string(chars, true)
    }

    /// Reads `chars` characters that may be split over CONTINUE records.
    /// Each continuation starts with a fresh option byte that may switch the character width.
    fn read_string(&mut self, chars: usize, is_extend: bool) -> Result<String, RustyChartsError> {
        let mut content = String::with_capacity(chars);
        let flag = self.read_u8()?;
        let mut is_high_byte = (flag & 0x1) > 0;
        let rich_string_count = if is_extend && (flag & 0x8) > 0 { // is_rich_string
            self.read_u16()? as usize
        } else {
            0
        };
        let phonetic_count = if is_extend && (flag & 0x4) > 0 { // contains_phonetic
            self.read_usize()?
        } else {
            0
        };

        let mut remaining = chars;
        loop {
            let encoding = self.encoding;
            let expected = Self::chars_to_bytes(is_high_byte, remaining);
            let (bytes, actual) = self.read(expected);
            if is_high_byte {
                let (string, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
                content.push_str(&string);
            } else if encoding == encoding_rs::UTF_16LE {
                // Compressed strings hold the low byte of each UTF-16 code unit
                content.extend(bytes.iter().map(|byte| *byte as char));
            } else {
                let (string, _) = encoding.decode_without_bom_handling(bytes);
                content.push_str(&string);
            }

            remaining -= Self::bytes_to_chars(is_high_byte, actual).min(remaining);
            if remaining == 0 {
                break;
            } else if actual == 0 {
                Err(Biff8Error::NoEnoughDataError(expected))?
            }
            is_high_byte = (self.read_u8()? & 0x1) > 0;
        }

        // Skip rgRun
        self.skip(4 * rich_string_count)?;
        // Skip ExtRst
        self.skip(phonetic_count)?;
        Ok(content)
    }

    /// Converts character count to byte count based on encoding
    #[inline]
    fn chars_to_bytes(is_high_byte: bool, chars: usize) -> usize {
        if is_high_byte { chars << 1 } else { chars }
    }

    /// Converts byte count to character count based on encoding
    #[inline]
    fn bytes_to_chars(is_high_byte: bool, bytes: usize) -> usize {
        if is_high_byte { bytes >> 1 } else { bytes }
    }
}

/// Decodes an RK value: bit 0 divides by 100, bit 1 selects a 30-bit signed integer
/// over the high 30 bits of an IEEE double.
pub(crate) fn decode_rk_number(value: u32) -> f64 {
    let is_percentage = (value & 0x01) != 0;
    let is_integer = (value & 0x02) != 0;

    let value = if is_integer {
        ((value as i32) >> 2) as f64
    } else {
        f64::from_bits(((value >> 2) as u64) << 34)
    };
    if is_percentage {
        value / 100.0
    } else {
        value
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
