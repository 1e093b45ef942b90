//! Streaming decoder for a single ZIP entry.

use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{Read, Seek, Write};

use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Decode `entry` into `writer`, `chunk_size` bytes at a time.
///
/// The uncompressed length and CRC-32 are checked once the payload is
/// exhausted, so a corrupted or truncated entry always fails here even when
/// the deflate stream itself ends cleanly. Returns the number of bytes written.
pub fn decode_entry<R: Read + Seek>(
    parser: &mut ZipParser<R>,
    entry: &ZipFileEntry,
    writer: &mut dyn Write,
    chunk_size: usize,
) -> Result<u64> {
    if entry.is_encrypted() {
        bail!("'{}' is encrypted, which is not supported", entry.file_name);
    }

    let raw = parser.raw_reader(entry)?;
    let mut source: Box<dyn Read + '_> = match entry.compression_method {
        CompressionMethod::Stored => Box::new(raw),
        CompressionMethod::Deflate => Box::new(DeflateDecoder::new(raw)),
        CompressionMethod::Unknown(method) => {
            bail!(
                "unsupported compression method {} for '{}'",
                method,
                entry.file_name
            )
        }
    };

    let mut crc = Crc::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut written = 0u64;

    loop {
        let n = source
            .read(&mut buf)
            .with_context(|| format!("data error in '{}'", entry.file_name))?;
        if n == 0 {
            break;
        }
        written += n as u64;
        if written > entry.uncompressed_size {
            bail!(
                "data error in '{}': more than the declared {} bytes",
                entry.file_name,
                entry.uncompressed_size
            );
        }
        crc.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("failed to write '{}'", entry.file_name))?;
    }

    if written != entry.uncompressed_size {
        bail!(
            "data error in '{}': expected {} bytes, got {}",
            entry.file_name,
            entry.uncompressed_size,
            written
        );
    }
    if crc.sum() != entry.crc32 {
        bail!(
            "CRC error in '{}': expected {:08x}, got {:08x}",
            entry.file_name,
            entry.crc32,
            crc.sum()
        );
    }

    Ok(written)
}
