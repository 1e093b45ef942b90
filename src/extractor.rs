//! Extraction façade over stream-backed archives.
//!
//! [`StreamExtractor`] pairs an archive format with [`ExtractOptions`] and
//! exposes one call per destination: a directory, a single buffer, a caller
//! writer or a map of buffers keyed by item path. Each call builds the
//! matching sink and drives a fresh [`InputArchive`] through it.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use std::path::Path;

use tracing::debug;

use crate::archive::{ArchiveFormat, ArchiveItem, InputArchive};
use crate::error::{Error, ExtractionFailure, Result};
use crate::options::ExtractOptions;
use crate::sink::{BufferMapSink, BufferSink, DirectorySink, StreamSink};

/// Extracts archives that live in a stream rather than at a path.
///
/// Every call opens its own [`InputArchive`] over the given reader, drives it
/// once and drops it before returning, whatever the outcome. Readers can be
/// passed by value or as `&mut` so the caller keeps ownership.
///
/// # Example
///
/// ```no_run
/// use std::io::Cursor;
/// use streamzip::{ArchiveFormat, StreamExtractor};
///
/// # fn main() -> streamzip::Result<()> {
/// let data = std::fs::read("bundle.zip").unwrap_or_default();
/// let extractor = StreamExtractor::new(ArchiveFormat::Zip)?;
/// let first = extractor.extract_to_buffer(Cursor::new(&data), 0)?;
/// println!("{} bytes", first.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StreamExtractor {
    format: ArchiveFormat,
    options: ExtractOptions,
}

impl StreamExtractor {
    /// Create an extractor for a concrete archive format, with default options.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedFormat`] for [`ArchiveFormat::Auto`]:
    /// a stream carries no name to detect the format from.
    pub fn new(format: ArchiveFormat) -> Result<Self> {
        if format == ArchiveFormat::Auto {
            return Err(Error::UnsupportedFormat);
        }
        Ok(Self {
            format,
            options: ExtractOptions::default(),
        })
    }

    /// Replace the options used by every later call.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Format every archive is opened with.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Options applied to directory extraction and decoding.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    fn open<R: Read + Seek>(&self, reader: R) -> Result<InputArchive<R>> {
        Ok(InputArchive::open(self.format, reader)?.with_chunk_size(self.options.chunk_size))
    }

    /// List every item in the archive, in archive order.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveOpen`] when the stream is not a readable archive.
    pub fn items<R: Read + Seek>(&self, reader: R) -> Result<Vec<ArchiveItem>> {
        Ok(self.open(reader)?.items().to_vec())
    }

    /// Extract the whole archive below `out_dir`, creating directories for
    /// folder items and for the parents of every file.
    ///
    /// # Arguments
    ///
    /// * `reader` - Seekable stream holding the archive
    /// * `out_dir` - Root of the extracted tree; created on demand
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveOpen`] if the stream cannot be opened, otherwise
    /// [`Error::ExtractionFailed`] listing every item that could not be
    /// written. Items that did succeed stay on disk.
    pub fn extract_all<R: Read + Seek>(&self, reader: R, out_dir: impl AsRef<Path>) -> Result<()> {
        self.extract_items(reader, &[], out_dir)
    }

    /// Extract the given items below `out_dir`; an empty slice means all.
    ///
    /// Every index is checked before any file is created, so an out-of-range
    /// index leaves `out_dir` untouched.
    pub fn extract_items<R: Read + Seek>(
        &self,
        reader: R,
        indices: &[usize],
        out_dir: impl AsRef<Path>,
    ) -> Result<()> {
        let mut archive = self.open(reader)?;
        for &index in indices {
            archive.item(index)?;
        }

        let out_dir = out_dir.as_ref();
        debug!(out_dir = %out_dir.display(), selected = indices.len(), "extracting to directory");
        let mut sink = DirectorySink::new(out_dir, &self.options);
        archive.extract(indices, &mut sink)
    }

    /// Extract one file item into a new buffer.
    ///
    /// # Arguments
    ///
    /// * `reader` - Seekable stream holding the archive
    /// * `index` - Zero-based item index
    ///
    /// # Returns
    ///
    /// The decoded bytes of the item.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] and [`Error::CannotExtractFolder`] are
    /// reported before any data is decoded; a corrupt item yields
    /// [`Error::ExtractionFailed`].
    pub fn extract_to_buffer<R: Read + Seek>(&self, reader: R, index: usize) -> Result<Vec<u8>> {
        let mut archive = self.open(reader)?;
        check_file_item(&archive, index)?;

        let mut sink = BufferSink::new();
        archive.extract(&[index], &mut sink)?;
        sink.into_buffer().ok_or_else(|| {
            Error::ExtractionFailed(ExtractionFailure::from_message(format!(
                "no data was produced for item {index}"
            )))
        })
    }

    /// Extract one file item into `writer`.
    ///
    /// Same checks as [`extract_to_buffer`](Self::extract_to_buffer). If
    /// decoding fails midway, the bytes already written stay in `writer`.
    pub fn extract_to_writer<R: Read + Seek, W: Write>(
        &self,
        reader: R,
        index: usize,
        writer: W,
    ) -> Result<()> {
        let mut archive = self.open(reader)?;
        check_file_item(&archive, index)?;

        let mut sink = StreamSink::new(writer);
        archive.extract(&[index], &mut sink)
    }

    /// Extract every file item into `out_map`, keyed by item path.
    /// Folders are filtered out before the archive is driven.
    ///
    /// Entries already in `out_map` under other paths are left alone. On
    /// [`Error::ExtractionFailed`] the map still holds every item that
    /// decoded before and after the failing one.
    pub fn extract_to_map<R: Read + Seek>(
        &self,
        reader: R,
        out_map: &mut BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        let mut archive = self.open(reader)?;
        let files: Vec<usize> = archive
            .items()
            .iter()
            .filter(|item| !item.is_folder)
            .map(|item| item.index)
            .collect();
        // An empty selection would mean "everything" to the handle.
        if files.is_empty() {
            return Ok(());
        }

        let mut sink = BufferMapSink::new(out_map);
        archive.extract(&files, &mut sink)
    }

    /// Verify every item decodes with the right size and CRC. Nothing is
    /// written anywhere.
    pub fn test<R: Read + Seek>(&self, reader: R) -> Result<()> {
        let mut archive = self.open(reader)?;
        let mut scratch = BTreeMap::new();
        let mut sink = BufferMapSink::new(&mut scratch);
        archive.test(&mut sink)
    }
}

fn check_file_item<R: Read + Seek>(archive: &InputArchive<R>, index: usize) -> Result<()> {
    let item = archive.item(index)?;
    if item.is_folder {
        return Err(Error::CannotExtractFolder {
            index,
            path: item.path.clone(),
        });
    }
    Ok(())
}
