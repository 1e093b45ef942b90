//! Sinks that keep decoded items in memory.

use std::collections::BTreeMap;
use std::io;

use super::{ExtractSink, ItemOutcome, ItemTarget, passive_target};
use crate::archive::{ArchiveItem, ExtractMode};

/// Upper bound on the capacity reserved up front from a declared item size.
const PREALLOC_LIMIT: u64 = 1 << 20;

fn initial_capacity(item: &ArchiveItem) -> usize {
    item.size.min(PREALLOC_LIMIT) as usize
}

/// Collects a single item into an owned buffer.
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Option<(String, Vec<u8>)>,
}

impl BufferSink {
    /// An empty sink; nothing is allocated until a file item arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the item held, if any item was received.
    pub fn path(&self) -> Option<&str> {
        self.buffer.as_ref().map(|(path, _)| path.as_str())
    }

    /// Take the decoded bytes, or `None` if no file item was received.
    pub fn into_buffer(self) -> Option<Vec<u8>> {
        self.buffer.map(|(_, data)| data)
    }
}

impl ExtractSink for BufferSink {
    fn begin_item(&mut self, item: &ArchiveItem, mode: ExtractMode) -> io::Result<ItemTarget<'_>> {
        if let Some(target) = passive_target(item, mode) {
            return Ok(target);
        }
        let (_, data) = self
            .buffer
            .insert((item.path.clone(), Vec::with_capacity(initial_capacity(item))));
        Ok(ItemTarget::Write(data))
    }

    fn finish_item(&mut self, _item: &ArchiveItem, _outcome: ItemOutcome) -> io::Result<()> {
        Ok(())
    }
}

/// Collects every non-folder item into a caller-owned map keyed by item path.
///
/// An entry is reset when its item starts, so a path that occurs twice in
/// the archive ends up holding the later item's bytes.
pub struct BufferMapSink<'a> {
    map: &'a mut BTreeMap<String, Vec<u8>>,
}

impl<'a> BufferMapSink<'a> {
    /// Write into `map`. Existing entries under other paths are kept.
    pub fn new(map: &'a mut BTreeMap<String, Vec<u8>>) -> Self {
        Self { map }
    }
}

impl ExtractSink for BufferMapSink<'_> {
    fn begin_item(&mut self, item: &ArchiveItem, mode: ExtractMode) -> io::Result<ItemTarget<'_>> {
        if let Some(target) = passive_target(item, mode) {
            return Ok(target);
        }
        let data = self.map.entry(item.path.clone()).or_default();
        data.clear();
        data.reserve(initial_capacity(item));
        Ok(ItemTarget::Write(data))
    }

    fn finish_item(&mut self, _item: &ArchiveItem, _outcome: ItemOutcome) -> io::Result<()> {
        Ok(())
    }
}
