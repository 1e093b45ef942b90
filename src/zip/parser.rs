//! Low-level ZIP archive parser.
//!
//! Reads ZIP structures from any seekable stream. The parser owns the
//! stream for its whole lifetime.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the stream's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For extraction, read each entry's Local File Header and data

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom, Take};

use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// DOS directory attribute bit in the external attributes field.
const DOS_DIRECTORY_ATTR: u32 = 0x10;

/// ZIP parser over a seekable stream.
pub struct ZipParser<R: Read + Seek> {
    /// The underlying stream
    reader: R,
    /// Total size of the stream in bytes
    size: u64,
}

impl<R: Read + Seek> ZipParser<R> {
    /// Wrap a stream. The stream length is taken by seeking to its end.
    pub fn new(mut reader: R) -> Result<Self> {
        let size = reader
            .seek(SeekFrom::End(0))
            .context("failed to determine stream length")?;
        Ok(Self { reader, size })
    }

    /// Total size of the underlying stream.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader
            .read_exact(buf)
            .with_context(|| format!("unexpected end of stream at offset {}", offset))?;
        Ok(())
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the comment-less layout first, then scans backwards over the
    /// largest possible comment.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the stream).
    pub fn find_eocd(&mut self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            bail!("Not a valid ZIP file: stream is only {} bytes", self.size);
        }

        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.read_at(offset, &mut buf)?;

        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.read_at(search_start, &mut buf)?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            // The comment length must account for every trailing byte.
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file: end of central directory not found")
    }

    /// Read the ZIP64 End of Central Directory record that the locator
    /// right before the regular EOCD points at.
    pub fn read_zip64_eocd(&mut self, eocd_offset: u64) -> Result<Zip64Eocd> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EocdLocator::SIZE as u64)
            .context("ZIP64 locator is missing")?;
        let mut locator_buf = vec![0u8; Zip64EocdLocator::SIZE];
        self.read_at(locator_offset, &mut locator_buf)?;
        let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64Eocd::MIN_SIZE];
        self.read_at(locator.eocd64_offset, &mut eocd64_buf)?;
        Zip64Eocd::from_bytes(&eocd64_buf)
    }

    /// Read every Central Directory record.
    pub fn list_files(&mut self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            bail!(
                "central directory ({} bytes at offset {}) exceeds stream size {}",
                cd_size,
                cd_offset,
                self.size
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.read_at(cd_offset, &mut cd_data)?;

        // Each record needs at least 46 bytes, which bounds a corrupt count.
        let capacity = total_entries.min(cd_size / 46) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for index in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)
                .with_context(|| format!("corrupt central directory record {}", index))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Offset of the first data byte of `entry`, found by reading its
    /// Local File Header (whose extra field may differ from the central one).
    pub fn data_offset(&mut self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.read_at(entry.lfh_offset, &mut lfh_buf)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("invalid local file header for '{}'", entry.file_name);
        }

        let mut cursor = Cursor::new(&lfh_buf[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Position the stream at the entry's data and return a reader limited
    /// to its compressed bytes.
    pub fn raw_reader(&mut self, entry: &ZipFileEntry) -> Result<Take<&mut R>> {
        let offset = self.data_offset(entry)?;
        if offset.saturating_add(entry.compressed_size) > self.size {
            bail!(
                "data for '{}' is truncated ({} bytes expected at offset {})",
                entry.file_name,
                entry.compressed_size,
                offset
            );
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok((&mut self.reader).take(entry.compressed_size))
    }
}

/// Parse one Central Directory File Header at the cursor position.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("invalid central directory file header signature");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Non-UTF8 names are kept lossily rather than rejected.
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

    let is_directory = file_name.ends_with('/')
        || file_name.ends_with('\\')
        || external_attrs & DOS_DIRECTORY_ATTR != 0;

    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == 0x0001 {
            // Fields are present only when the 32-bit header value is saturated.
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
        external_attrs,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_is_not_a_zip() {
        let mut parser = ZipParser::new(Cursor::new(Vec::new())).unwrap();
        let err = parser.list_files().unwrap_err();
        assert!(format!("{err:#}").contains("Not a valid ZIP file"));
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let mut eocd = vec![0u8; EndOfCentralDirectory::SIZE];
        eocd[0..4].copy_from_slice(EndOfCentralDirectory::SIGNATURE);
        let mut parser = ZipParser::new(Cursor::new(eocd)).unwrap();
        assert!(parser.list_files().unwrap().is_empty());
    }

    #[test]
    fn eocd_found_behind_comment() {
        let mut data = vec![0u8; EndOfCentralDirectory::SIZE];
        data[0..4].copy_from_slice(EndOfCentralDirectory::SIGNATURE);
        data[20..22].copy_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(b"hello");
        let mut parser = ZipParser::new(Cursor::new(data)).unwrap();
        let (_, offset) = parser.find_eocd().unwrap();
        assert_eq!(offset, 0);
    }

    #[test]
    fn oversized_central_directory_is_rejected() {
        let mut eocd = vec![0u8; EndOfCentralDirectory::SIZE];
        eocd[0..4].copy_from_slice(EndOfCentralDirectory::SIGNATURE);
        eocd[10..12].copy_from_slice(&1u16.to_le_bytes());
        eocd[12..16].copy_from_slice(&1000u32.to_le_bytes());
        let mut parser = ZipParser::new(Cursor::new(eocd)).unwrap();
        let err = parser.list_files().unwrap_err();
        assert!(format!("{err:#}").contains("exceeds stream size"));
    }
}
