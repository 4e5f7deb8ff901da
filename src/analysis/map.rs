//! The address to tag map produced by classification

use crate::analysis::{Block, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A map of block boundaries, each tagged with the classification of the
/// memory that follows it.
///
/// Keys, in ascending order, partition a range `[start, end]` into half-open
/// blocks `[addr_i, addr_{i+1})`. The final key is always `end`, tagged
/// `Tag::End`, and denotes the exclusive upper bound rather than a block.
///
/// Addresses are `u32` so that the end of a full 64K image (65536) can be
/// represented.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap {
    tags: BTreeMap<u32, Tag>,
}

impl TagMap {
    pub fn new() -> Self {
        TagMap {
            tags: BTreeMap::new(),
        }
    }

    /// Create a map covering `[start, end)` with a single block.
    pub fn with_range(start: u32, end: u32, tag: Tag) -> Self {
        let mut map = TagMap::new();

        map.insert(start, tag);
        map.insert(end, Tag::End);

        map
    }

    /// Tag a boundary, returning the tag that was there before.
    pub fn insert(&mut self, addr: u32, tag: Tag) -> Option<Tag> {
        log::trace!("boundary ${:04X} <- {}", addr, tag);

        self.tags.insert(addr, tag)
    }

    pub fn remove(&mut self, addr: u32) -> Option<Tag> {
        log::trace!("boundary ${:04X} removed", addr);

        self.tags.remove(&addr)
    }

    /// The tag of the boundary at exactly `addr`.
    pub fn get(&self, addr: u32) -> Option<Tag> {
        self.tags.get(&addr).copied()
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.tags.contains_key(&addr)
    }

    /// The tag of the block that `addr` falls within.
    pub fn tag_at(&self, addr: u32) -> Option<Tag> {
        self.tags.range(..=addr).next_back().map(|(_, tag)| *tag)
    }

    /// Remove every boundary strictly between `lo` and `hi`.
    ///
    /// Yields the tag of the lowest boundary removed, if any.
    pub fn remove_within(&mut self, lo: u32, hi: u32) -> Option<Tag> {
        if hi <= lo.saturating_add(1) {
            return None;
        }

        let doomed: Vec<(u32, Tag)> = self
            .tags
            .range(lo + 1..hi)
            .map(|(addr, tag)| (*addr, *tag))
            .collect();

        for (addr, _) in doomed.iter() {
            self.remove(*addr);
        }

        doomed.first().map(|(_, tag)| *tag)
    }

    /// Iterate over every boundary in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Tag)> + '_ {
        self.tags.iter().map(|(addr, tag)| (*addr, *tag))
    }

    /// Snapshot the blocks described by the map.
    ///
    /// The final boundary does not begin a block and is not listed.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(self.tags.len());
        let mut iter = self.tags.iter().peekable();

        while let Some((start, tag)) = iter.next() {
            if let Some((end, _)) = iter.peek() {
                blocks.push(Block::from_parts(*start, **end, *tag));
            }
        }

        blocks
    }

    /// Snapshot the blocks carrying a particular tag.
    pub fn blocks_tagged(&self, tag: Tag) -> Vec<Block> {
        self.blocks()
            .into_iter()
            .filter(|block| block.tag() == tag)
            .collect()
    }

    /// Determine if any block is still unclassified.
    pub fn has_unknown(&self) -> bool {
        self.tags.values().any(|tag| *tag == Tag::Unknown)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

}

impl From<BTreeMap<u32, Tag>> for TagMap {
    fn from(tags: BTreeMap<u32, Tag>) -> Self {
        TagMap { tags }
    }
}
