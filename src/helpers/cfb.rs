//! OLE Compound File Binary (CFB) reader for legacy Excel (.xls) workbooks.
//! Only the pieces needed to pull named streams out of the container are implemented.

use crate::error::RustyChartsError;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use crate::helpers::bytes::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;

// Anything at or above this value marks the end of a chain (or a free / FAT / DIFAT sector)
const MAX_REG_SECT: usize = 0xFFFFFFFB;

/// Streams smaller than this live in the mini stream
const MINI_STREAM_CUTOFF: usize = 4096;

const MINI_SECTOR_SIZE: usize = 64;

const DIRECTORY_ENTRY_SIZE: usize = 128;

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid Sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("The number of double indirect file allocation table error: expect '{0}', actual '{1}'")]
    DoubleIndirectFileAllocationTableError(usize, usize),

    #[error("The number of file allocation table error: expect '{0}', actual '{1}'")]
    FileAllocationTableError(usize, usize),

    #[error("Empty Root directory")]
    RootDirectoryError,
}

/// Compound File Binary structure representing the entire OLE file
pub(crate) struct Cfb {
    /// Directory entries by stream name
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    /// Contents of the root entry's stream, addressed in 64-byte mini sectors
    mini_sectors: Sectors,
}

impl Cfb {
    /// Checks the 8-byte OLE signature without parsing the rest of the container
    pub(crate) fn is_cfb<RS: Read + Seek>(reader: &mut RS) -> Result<bool, RustyChartsError> {
        let mut signature = [0u8; 8];
        reader.seek(SeekFrom::Start(0))?;
        let is_cfb = match reader.read_exact(&mut signature) {
            Ok(()) => to_u64(&signature) == Header::SIGNATURE,
            Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => false,
            Err(error) => Err(error)?,
        };
        reader.seek(SeekFrom::Start(0))?;
        Ok(is_cfb)
    }

    /// Reads the whole container into memory and indexes its directory
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, RustyChartsError> {
        let size = reader.seek(SeekFrom::End(0))?;
        if size < 512 {
            Err(CfbError::FileFormatError)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data: Vec<u8> = vec![0u8; size as usize];
        reader.read_exact(&mut data)?;

        let header = Header::new(&data[..512])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let file_allocation_table = Self::load_file_allocation_table(&sectors, &header)?;
        let directories = Self::load_directories(&file_allocation_table, &sectors, header.directory_shift)?;
        let mini_file_allocation_table = Self::load_mini_file_allocation_table(&file_allocation_table, &sectors, &header)?;
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => Self::load_mini_sectors(&file_allocation_table, &sectors, root)?,
            None => Sectors { data: Vec::new(), size: MINI_SECTOR_SIZE },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads the contents of a stream, `None` when no such stream exists
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, RustyChartsError> {
        if let Some(directory) = self.directories.get(name) {
            let mut bytes = if directory.count < MINI_STREAM_CUTOFF {
                Self::read_bytes(&self.mini_file_allocation_table, &self.mini_sectors, directory.index)?
            } else {
                Self::read_bytes(&self.file_allocation_table, &self.sectors, directory.index)?
            };
            bytes.truncate(directory.count);
            Ok(Some(bytes))
        } else {
            Ok(None)
        }
    }

    /// Builds the FAT from the 109 header DIFAT entries plus the chained DIFAT sectors
    fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, RustyChartsError> {
        let mut double_indirect_file_allocation_table: Vec<usize> = to_usize_iter(&sectors.data[76..512]).collect();

        let mut count = 0usize;
        let mut index = header.double_indirect_file_allocation_table_shift;
        while index < MAX_REG_SECT {
            if count > sectors.count() {
                Err(CfbError::FileFormatError)?
            }
            // The last entry of every DIFAT sector points at the next one
            double_indirect_file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
            index = double_indirect_file_allocation_table.pop().ok_or(CfbError::FileFormatError)?;
            count += 1;
        }
        if count != header.double_indirect_file_allocation_table_count {
            Err(CfbError::DoubleIndirectFileAllocationTableError(header.double_indirect_file_allocation_table_count, count))?
        }

        let mut file_allocation_table: Vec<usize> = Vec::new();
        let mut count = 0usize;
        for index in double_indirect_file_allocation_table {
            if index < MAX_REG_SECT {
                file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
                count += 1;
            }
        }
        if count != header.file_allocation_table_count {
            Err(CfbError::FileAllocationTableError(header.file_allocation_table_count, count))?
        }

        Ok(file_allocation_table)
    }

    fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<HashMap<String, Directory>, RustyChartsError> {
        let bytes = Self::read_bytes(file_allocation_table, sectors, index)?;
        let directories: HashMap<String, Directory> = bytes
            .chunks_exact(DIRECTORY_ENTRY_SIZE)
            .map(Directory::new)
            .filter(|(name, _)| !name.is_empty())
            .collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    fn load_mini_file_allocation_table(file_allocation_table: &[usize], sectors: &Sectors, header: &Header) -> Result<Vec<usize>, RustyChartsError> {
        Ok(if header.mini_file_allocation_table_sector_count > 0 {
            let mini_file_allocation_table = Self::read_bytes(file_allocation_table, sectors, header.mini_file_allocation_table_sector_shift)?;
            to_usize_iter(&mini_file_allocation_table).collect()
        } else {
            Vec::new()
        })
    }

    fn load_mini_sectors(file_allocation_table: &[usize], sectors: &Sectors, root: &Directory) -> Result<Sectors, RustyChartsError> {
        let mut data = Self::read_bytes(file_allocation_table, sectors, root.index)?;
        data.truncate(root.count);
        // Mini sectors have no header sector in front of them
        let mut padded = vec![0u8; MINI_SECTOR_SIZE];
        padded.append(&mut data);
        Ok(Sectors { data: padded, size: MINI_SECTOR_SIZE })
    }

    /// Follows a sector chain and concatenates its sectors
    fn read_bytes(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<Vec<u8>, RustyChartsError> {
        let mut content: Vec<u8> = Vec::new();
        let mut index = index;
        let mut visited = 0usize;
        while index < MAX_REG_SECT {
            visited += 1;
            if visited > file_allocation_table.len() {
                // Longer than the table itself, so the chain loops
                Err(CfbError::FileFormatError)?
            }
            content.extend_from_slice(sectors.get(index)?);
            index = *file_allocation_table.get(index).ok_or(CfbError::FileFormatError)?;
        }
        Ok(content)
    }
}

/// Sector storage; sector `i` starts right after the 512-byte header slot
#[derive(Debug)]
struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let source = index
            .checked_add(1)
            .and_then(|index| index.checked_mul(self.size))
            .filter(|source| *source < self.data.len())
            .ok_or(CfbError::FileFormatError)?;
        let target = self.data.len().min(source + self.size);
        Ok(&self.data[source..target])
    }

    /// Number of sectors after the header
    fn count(&self) -> usize {
        (self.data.len() / self.size).saturating_sub(1)
    }
}

#[derive(Debug)]
struct Header {
    signature: u64,
    major_version: u16,
    sector_shift: u16,
    file_allocation_table_count: usize,
    directory_shift: usize,
    mini_file_allocation_table_sector_shift: usize,
    mini_file_allocation_table_sector_count: usize,
    double_indirect_file_allocation_table_shift: usize,
    double_indirect_file_allocation_table_count: usize,
}

impl Header {
    const SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;

    /// Parses the first 512 bytes of the container
    fn new(data: &[u8]) -> Result<Self, RustyChartsError> {
        let header = Header {
            signature: to_u64(&data[0..8]),
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            file_allocation_table_count: to_usize(&data[44..48]),
            directory_shift: to_usize(&data[48..52]),
            mini_file_allocation_table_sector_shift: to_usize(&data[60..64]),
            mini_file_allocation_table_sector_count: to_usize(&data[64..68]),
            double_indirect_file_allocation_table_shift: to_usize(&data[68..72]),
            double_indirect_file_allocation_table_count: to_usize(&data[72..76]),
        };

        if header.signature != Self::SIGNATURE {
            Err(CfbError::OleSignatureError)?;
        }

        Ok(header)
    }

    fn sector_size(&self) -> Result<usize, RustyChartsError> {
        match (self.major_version, self.sector_shift) {
            (3, 0x0009) => Ok(512),
            // Version 4 pads the 512-byte header to a full 4096-byte sector
            (4, 0x000C) => Ok(4096),
            (major_version, sector_shift) => Err(CfbError::SectorSizeError(major_version, sector_shift))?,
        }
    }
}

#[derive(Debug)]
struct Directory {
    index: usize,
    count: usize,
}

impl Directory {
    fn new(bytes: &[u8]) -> (String, Directory) {
        let size = (to_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..size]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };

        let index = to_usize(&bytes[116..120]);
        let count = to_u64(&bytes[120..128]) as usize;
        (name, Directory { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_short_input() {
        let mut reader = Cursor::new(vec![0u8; 100]);
        let result = Cfb::new(&mut reader);
        assert!(matches!(result, Err(RustyChartsError::CfbHelperError(CfbError::FileFormatError))));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut reader = Cursor::new(vec![0u8; 1024]);
        let result = Cfb::new(&mut reader);
        assert!(matches!(result, Err(RustyChartsError::CfbHelperError(CfbError::OleSignatureError))));
    }

    #[test]
    fn detects_signature() {
        let mut data = Header::SIGNATURE.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 8]);
        assert!(Cfb::is_cfb(&mut Cursor::new(data)).unwrap());
        assert!(!Cfb::is_cfb(&mut Cursor::new(b"PK\x03\x04".to_vec())).unwrap());
        assert!(!Cfb::is_cfb(&mut Cursor::new(Vec::new())).unwrap());
    }

    #[test]
    fn sector_access_is_bounds_checked() {
        let sectors = Sectors { data: vec![1u8; 512 * 3], size: 512 };
        assert_eq!(sectors.count(), 2);
        assert_eq!(sectors.get(0).unwrap().len(), 512);
        assert_eq!(sectors.get(1).unwrap().len(), 512);
        assert!(sectors.get(2).is_err());
        assert!(sectors.get(usize::MAX).is_err());
    }

    #[test]
    fn sector_chains_stop_at_end_marker_and_detect_loops() {
        let mut data = vec![0u8; 512];
        data.extend(vec![b'a'; 512]);
        data.extend(vec![b'b'; 512]);
        let sectors = Sectors { data, size: 512 };

        let table = vec![1, 0xFFFFFFFE];
        let bytes = Cfb::read_bytes(&table, &sectors, 0).unwrap();
        assert_eq!(bytes.len(), 1024);
        assert_eq!(bytes[0], b'a');
        assert_eq!(bytes[1023], b'b');

        let looping = vec![1, 0];
        assert!(Cfb::read_bytes(&looping, &sectors, 0).is_err());
    }
}
