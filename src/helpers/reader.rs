use crate::error::RustyChartsError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

/// A seekable source for spreadsheet bytes: either a file on disk or an
/// uploaded buffer held in memory.
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory buffer (uploaded content)
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local file for reading
    pub(crate) fn open(path: &Path) -> Result<UnifiedReader, RustyChartsError> {
        let file = File::open(path)?;
        Ok(UnifiedReader::Local(BufReader::new(file)))
    }

    /// Wraps bytes already held in memory
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Memory(Cursor::new(bytes))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;

    #[test]
    fn test_open_local_file() {
        let result = UnifiedReader::open(Path::new("Cargo.toml"));
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());

        let result = UnifiedReader::open(Path::new("non_existent_file.xlsx"));
        assert!(result.is_err(), "Should fail to open non-existent file");
    }

    #[test]
    fn test_memory_reader_seeks() {
        let mut reader = UnifiedReader::from_bytes(b"abcdef".to_vec());
        reader.seek(SeekFrom::Start(3)).unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "def");
    }
}
