//! ZIP codec backend.
//!
//! This is the only module that knows the ZIP on-disk layout. The archive
//! handle sees it through three operations: list the central directory,
//! report per-entry metadata, and decode one entry into a writer.
//!
//! - [`structures`]: EOCD, ZIP64 and central directory records
//! - [`parser`]: reads those records from a seekable stream
//! - [`codec`]: streams one entry's STORED or DEFLATE payload with CRC checks
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod codec;
mod parser;
mod structures;

pub use codec::decode_entry;
pub use parser::ZipParser;
pub use structures::*;
