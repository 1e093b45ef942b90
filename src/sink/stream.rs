use std::io::{self, Write};

use super::{ExtractSink, ItemOutcome, ItemTarget, passive_target};
use crate::archive::{ArchiveItem, ExtractMode};

/// Writes decoded bytes straight into a caller-supplied writer.
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    /// Forward every file item to `writer`, flushing after each one.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give the writer back.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExtractSink for StreamSink<W> {
    fn begin_item(&mut self, item: &ArchiveItem, mode: ExtractMode) -> io::Result<ItemTarget<'_>> {
        if let Some(target) = passive_target(item, mode) {
            return Ok(target);
        }
        Ok(ItemTarget::Write(&mut self.writer))
    }

    fn finish_item(&mut self, _item: &ArchiveItem, _outcome: ItemOutcome) -> io::Result<()> {
        self.writer.flush()
    }
}
