//! # streamzip
//!
//! Extract ZIP archives that live in a stream instead of at a path.
//!
//! The archive can be any `Read + Seek` source (an in-memory `Cursor`, an
//! open file, a decrypted view) and the extracted bytes can go to one of
//! several destinations:
//!
//! - a directory tree ([`StreamExtractor::extract_all`])
//! - a single buffer ([`StreamExtractor::extract_to_buffer`])
//! - a single writer ([`StreamExtractor::extract_to_writer`])
//! - a map of path to buffer ([`StreamExtractor::extract_to_map`])
//!
//! [`StreamExtractor::test`] decodes everything and checks sizes and CRCs
//! without writing anywhere.
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::io::Cursor;
//! use streamzip::{ArchiveFormat, StreamExtractor};
//!
//! fn main() -> streamzip::Result<()> {
//!     let bytes = std::fs::read("archive.zip").expect("read archive");
//!     let extractor = StreamExtractor::new(ArchiveFormat::Zip)?;
//!
//!     extractor.test(Cursor::new(&bytes))?;
//!
//!     let mut files = BTreeMap::new();
//!     extractor.extract_to_map(Cursor::new(&bytes), &mut files)?;
//!     for (path, data) in &files {
//!         println!("{path}: {} bytes", data.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod extractor;
pub mod options;
pub mod sink;
pub mod zip;

pub use archive::{ArchiveFormat, ArchiveItem, ExtractMode, InputArchive};
pub use cli::Cli;
pub use error::{Error, ExtractionFailure, ItemFailure, Result};
pub use extractor::StreamExtractor;
pub use options::{ExtractOptions, OverwriteMode};
pub use sink::{BufferMapSink, BufferSink, DirectorySink, ExtractSink, ItemOutcome, ItemTarget, StreamSink};
