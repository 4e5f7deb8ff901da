//! Analysis passes shared between the synthesizers.

use crate::analysis::{find_text, is_zero_fill, Block, Tag, TagMap, TextContext};
use crate::memory::Image;
use crate::project::Config;

/// Run a pass until it reports that it made no further changes.
///
/// The pass returns `true` when it changed something and wants to be run
/// again. Yields the number of passes that made a change.
pub fn fixpoint<F>(mut pass: F) -> usize
where
    F: FnMut() -> bool,
{
    let mut changed = 0;

    while pass() {
        changed += 1;
    }

    changed
}

/// Split any text found within a data block out into text blocks.
///
/// Each span of text becomes a text block, and byte data resumes wherever a
/// span ends inside the block.
pub fn mark_text(image: &Image, config: &Config, map: &mut TagMap, block: &Block) -> usize {
    let spans = find_text(image, config, block.start(), block.end(), TextContext::Data);

    for (start, end) in spans.iter() {
        map.insert(*start, Tag::Text);

        if *end < block.end() {
            map.insert(*end, Tag::Bytes);
        }
    }

    spans.len()
}

/// Split any text found within a code block out into text blocks.
///
/// Code containing text is demoted: the block start becomes byte data, and
/// only the remainder after the final span of text is reopened as code.
pub fn mark_text_in_code(image: &Image, config: &Config, map: &mut TagMap, block: &Block) -> usize {
    let spans = find_text(image, config, block.start(), block.end(), TextContext::Code);
    let last_end = match spans.last() {
        Some((_, end)) => *end,
        None => return 0,
    };

    map.insert(block.start(), Tag::Bytes);

    for (start, end) in spans.iter() {
        map.insert(*start, Tag::Text);

        if *end < block.end() {
            map.insert(*end, Tag::Bytes);
        }
    }

    if last_end < block.end() {
        map.insert(last_end, Tag::Code);
    }

    spans.len()
}

/// Retag every all-zero byte data block as zero fill.
pub fn mark_zero_fill(image: &Image, map: &mut TagMap) -> usize {
    let mut count = 0;

    for block in map.blocks_tagged(Tag::Bytes) {
        if is_zero_fill(image, block.start(), block.end()) {
            map.insert(block.start(), Tag::Zero);
            count += 1;
        }
    }

    count
}
