//! Output sinks driven by [`InputArchive`](crate::InputArchive).
//!
//! For every selected item the handle asks the sink where the bytes go
//! ([`ExtractSink::begin_item`]), streams the decoded chunks into the
//! returned writer, then tells the sink the item is done
//! ([`ExtractSink::finish_item`]). A sink reports trouble by returning an
//! `io::Error`; the handle records it against that item and moves on.

mod directory;
mod memory;
mod stream;

use std::io::{self, Write};

use crate::archive::{ArchiveItem, ExtractMode};

pub use directory::DirectorySink;
pub use memory::{BufferMapSink, BufferSink};
pub use stream::StreamSink;

/// Where the decoded bytes of one item go.
pub enum ItemTarget<'a> {
    /// Decode into this writer.
    Write(&'a mut dyn Write),
    /// Decode and verify, but drop the bytes.
    Discard,
    /// Do not decode the item at all.
    Skip,
}

/// Final state of an item handed back to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Ok,
    Failed,
}

/// Destination for the items of one extraction or test pass.
///
/// The handle calls [`begin_item`](Self::begin_item) and
/// [`finish_item`](Self::finish_item) in pairs, one item at a time, in the
/// order the items were selected.
pub trait ExtractSink {
    /// Prepare the destination for `item`.
    fn begin_item(&mut self, item: &ArchiveItem, mode: ExtractMode) -> io::Result<ItemTarget<'_>>;

    /// Close whatever `begin_item` opened. Called for every item that was not
    /// skipped, whether or not decoding succeeded.
    fn finish_item(&mut self, item: &ArchiveItem, outcome: ItemOutcome) -> io::Result<()>;
}

/// Target used by sinks that never write folders or test-mode data.
fn passive_target<'a>(item: &ArchiveItem, mode: ExtractMode) -> Option<ItemTarget<'a>> {
    if item.is_folder {
        Some(ItemTarget::Skip)
    } else if mode == ExtractMode::Test {
        Some(ItemTarget::Discard)
    } else {
        None
    }
}
