//! Archive handle over a caller-supplied stream.
//!
//! [`InputArchive`] owns the stream and the parsed item table for its whole
//! lifetime. Extraction and test passes borrow it mutably, so two passes can
//! never overlap on the same handle.

use std::io::{self, Read, Seek};

use tracing::{debug, info, warn};

use crate::error::{Error, ExtractionFailure, ItemFailure, Result};
use crate::sink::{ExtractSink, ItemOutcome, ItemTarget};
use crate::zip::{self, CompressionMethod, ZipFileEntry, ZipParser};

/// Archive formats a handle can be opened with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Detect from the data. Never valid for stream-backed archives, which
    /// carry no file name or extension to detect from.
    Auto,
    Zip,
}

impl ArchiveFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ArchiveFormat::Auto => "auto",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Whether a pass writes output or only verifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractMode {
    Extract,
    Test,
}

/// Metadata of one archive item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveItem {
    pub index: usize,
    /// Archive-internal path; `[<index>]` when the archive stores none.
    pub path: String,
    pub is_folder: bool,
    pub size: u64,
    pub packed_size: u64,
    pub crc32: u32,
    pub method: CompressionMethod,
    /// DOS date and time fields as stored in the archive.
    pub modified: (u16, u16),
}

impl ArchiveItem {
    fn from_entry(index: usize, entry: &ZipFileEntry) -> Self {
        let path = if entry.file_name.is_empty() {
            format!("[{index}]")
        } else {
            entry.file_name.clone()
        };
        Self {
            index,
            path,
            is_folder: entry.is_directory,
            size: entry.uncompressed_size,
            packed_size: entry.compressed_size,
            crc32: entry.crc32,
            method: entry.compression_method,
            modified: (entry.last_mod_date, entry.last_mod_time),
        }
    }

    /// Modification date as (year, month, day).
    pub fn modified_date(&self) -> (u16, u8, u8) {
        let date = self.modified.0;
        let day = (date & 0x1F) as u8;
        let month = ((date >> 5) & 0x0F) as u8;
        let year = ((date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Modification time as (hour, minute, second).
    pub fn modified_time(&self) -> (u8, u8, u8) {
        let time = self.modified.1;
        let second = ((time & 0x1F) * 2) as u8;
        let minute = ((time >> 5) & 0x3F) as u8;
        let hour = ((time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// An open archive backed by a seekable stream.
pub struct InputArchive<R: Read + Seek> {
    format: ArchiveFormat,
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
    items: Vec<ArchiveItem>,
    chunk_size: usize,
}

impl<R: Read + Seek> InputArchive<R> {
    /// Open `reader` as an archive of the given format.
    ///
    /// The whole item table is read here; later calls never fail with an
    /// open error.
    pub fn open(format: ArchiveFormat, reader: R) -> Result<Self> {
        if format == ArchiveFormat::Auto {
            return Err(Error::UnsupportedFormat);
        }

        let mut parser = ZipParser::new(reader).map_err(Error::archive_open)?;
        let entries = parser.list_files().map_err(Error::archive_open)?;
        let items = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| ArchiveItem::from_entry(index, entry))
            .collect();

        debug!(
            format = format.name(),
            items = entries.len(),
            size = parser.size(),
            "opened archive"
        );

        Ok(Self {
            format,
            parser,
            entries,
            items,
            chunk_size: crate::options::DEFAULT_CHUNK_SIZE,
        })
    }

    pub(crate) fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[ArchiveItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Result<&ArchiveItem> {
        self.items.get(index).ok_or(Error::IndexOutOfRange {
            index,
            count: self.items.len(),
        })
    }

    pub fn is_item_folder(&self, index: usize) -> Result<bool> {
        self.item(index).map(|item| item.is_folder)
    }

    /// Extract the given items through `sink`; an empty slice selects every
    /// item. All indices are validated before anything is processed.
    pub fn extract(&mut self, indices: &[usize], sink: &mut dyn ExtractSink) -> Result<()> {
        self.drive(indices, sink, ExtractMode::Extract)
    }

    /// Decode every item without producing output, verifying sizes and CRCs.
    pub fn test(&mut self, sink: &mut dyn ExtractSink) -> Result<()> {
        self.drive(&[], sink, ExtractMode::Test)
    }

    fn drive(
        &mut self,
        indices: &[usize],
        sink: &mut dyn ExtractSink,
        mode: ExtractMode,
    ) -> Result<()> {
        let selection: Vec<usize> = if indices.is_empty() {
            (0..self.items.len()).collect()
        } else {
            for &index in indices {
                self.item(index)?;
            }
            indices.to_vec()
        };

        let mut failures = Vec::new();
        let mut processed = 0usize;
        let mut bytes = 0u64;

        for index in selection {
            let item = &self.items[index];
            debug!(index, path = %item.path, ?mode, "processing item");

            let result = match sink.begin_item(item, mode) {
                Ok(ItemTarget::Skip) => {
                    debug!(index, path = %item.path, "skipped");
                    continue;
                }
                Ok(ItemTarget::Write(writer)) => {
                    zip::decode_entry(&mut self.parser, &self.entries[index], writer, self.chunk_size)
                }
                Ok(ItemTarget::Discard) => zip::decode_entry(
                    &mut self.parser,
                    &self.entries[index],
                    &mut io::sink(),
                    self.chunk_size,
                ),
                Err(err) => Err(anyhow::Error::new(err)
                    .context(format!("cannot create output for '{}'", item.path))),
            };

            let outcome = if result.is_ok() {
                ItemOutcome::Ok
            } else {
                ItemOutcome::Failed
            };
            let finished = sink.finish_item(item, outcome).map_err(|err| {
                anyhow::Error::new(err).context(format!("cannot finish output for '{}'", item.path))
            });

            match result.and_then(|written| finished.map(|()| written)) {
                Ok(written) => {
                    processed += 1;
                    bytes += written;
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    warn!(index, path = %item.path, error = %message, "item failed");
                    failures.push(ItemFailure {
                        index,
                        path: item.path.clone(),
                        message,
                    });
                }
            }
        }

        info!(
            ?mode,
            processed,
            failed = failures.len(),
            bytes,
            "archive pass finished"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ExtractionFailed(ExtractionFailure::new(failures)))
        }
    }
}
