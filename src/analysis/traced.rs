//! Classification guided by an execution trace
//!
//! Every address the trace saw executed seeds a block of code. From there,
//! code is grown forward to the next terminal instruction, unclassified
//! memory reached by a branch or call from code is promoted to code, and
//! whatever remains unclassified is treated as data.

use crate::analysis::passes::{fixpoint, mark_text, mark_zero_fill};
use crate::analysis::{find_terminal, Disassembly, Tag, TagMap};
use crate::arch::Decoder;
use crate::codemap::CodeBlock;
use crate::memory::Image;
use crate::project::Config;

/// Classify `[start, end)` of an image, given the blocks of code an
/// execution trace observed.
pub fn generate<D>(
    image: &Image,
    decoder: &D,
    config: &Config,
    start: u32,
    end: u32,
    code_blocks: &[CodeBlock],
) -> TagMap
where
    D: Decoder,
{
    let mut map = seed(start, end, code_blocks);
    log::debug!("Seeded {} code blocks from trace", code_blocks.len());

    let passes = fixpoint(|| extend_to_terminal(image, decoder, &mut map, end));
    log::debug!("Extended code blocks in {} passes", passes);

    let passes = fixpoint(|| promote_entry_points(image, decoder, &mut map, end));
    log::debug!("Promoted {} entry points", passes);

    split_at_terminals(image, decoder, &mut map);

    let passes = fixpoint(|| merge_fall_through(image, decoder, &mut map));
    log::debug!("Merged {} fall-through blocks", passes);

    let texts = classify_unknown(image, config, &mut map);
    log::debug!("Found {} text blocks", texts);

    let zeros = mark_zero_fill(image, &mut map);
    log::debug!("Found {} zero fill blocks", zeros);

    map
}

/// Build the initial map: everything unknown, except what the trace ran.
pub(crate) fn seed(start: u32, end: u32, code_blocks: &[CodeBlock]) -> TagMap {
    let mut map = TagMap::with_range(start, end, Tag::Unknown);

    for block in code_blocks {
        map.insert(block.start(), Tag::Code);

        if block.end() < end {
            map.insert(block.end(), Tag::Unknown);
        }
    }

    map
}

/// Grow one code block that runs off its end into unknown memory, up to the
/// next terminal instruction.
///
/// Returns `true` if a block was grown.
pub(crate) fn extend_to_terminal<D>(image: &Image, decoder: &D, map: &mut TagMap, end: u32) -> bool
where
    D: Decoder,
{
    for block in map.blocks_tagged(Tag::Code) {
        if map.get(block.end()) != Some(Tag::Unknown) {
            continue;
        }

        let last = decoder.iter(image, block.start(), block.end()).last();
        if last.map_or(false, |instr| instr.is_terminal()) {
            continue;
        }

        map.remove(block.end());
        find_terminal(image, decoder, map, block.end(), end, Some(Tag::Unknown));

        return true;
    }

    false
}

/// Promote the first instruction in an unknown block that code branches to
/// or calls, and the run of code following it.
///
/// Returns `true` if anything was promoted.
pub(crate) fn promote_entry_points<D>(
    image: &Image,
    decoder: &D,
    map: &mut TagMap,
    end: u32,
) -> bool
where
    D: Decoder,
{
    let disassembly = Disassembly::build(image, decoder, map);

    for entry in disassembly.entries() {
        if entry.tag() != Tag::Unknown {
            continue;
        }

        let reference = entry
            .instructions()
            .iter()
            .find_map(|instr| disassembly.code_referrer(instr.address()));

        if let Some(reference) = reference {
            let target = reference.as_target();
            log::trace!(
                "{} ${:04X} referenced from code at ${:04X}",
                reference.kind(),
                target,
                reference.as_source()
            );

            map.insert(target, Tag::Code);
            find_terminal(image, decoder, map, target, end, Some(entry.tag()));

            return true;
        }
    }

    false
}

/// Split every code block after each terminal instruction inside it.
pub(crate) fn split_at_terminals<D>(image: &Image, decoder: &D, map: &mut TagMap)
where
    D: Decoder,
{
    for block in map.blocks_tagged(Tag::Code) {
        let mut addr = block.start();

        while addr < block.end() {
            addr = find_terminal(image, decoder, map, addr, block.end(), Some(Tag::Code));
        }
    }
}

/// Join one code block to the code block after it, where it ends in a jump
/// to exactly the start of that block.
///
/// Returns `true` if two blocks were joined.
pub(crate) fn merge_fall_through<D>(image: &Image, decoder: &D, map: &mut TagMap) -> bool
where
    D: Decoder,
{
    let disassembly = Disassembly::build(image, decoder, map);

    for (index, entry) in disassembly.entries().iter().enumerate() {
        if entry.tag() != Tag::Code {
            continue;
        }

        let next = match disassembly.next(index) {
            Some(next) if next.tag() == Tag::Code => next,
            _ => continue,
        };

        let target = entry.last_instruction().and_then(|instr| instr.jump_target());
        if target == Some(next.start()) {
            map.remove(next.start());

            return true;
        }
    }

    false
}

/// Resolve every remaining unknown block to data, splitting out text.
///
/// Returns the number of text blocks found.
pub(crate) fn classify_unknown(image: &Image, config: &Config, map: &mut TagMap) -> usize {
    let mut texts = 0;

    for block in map.blocks_tagged(Tag::Unknown) {
        map.insert(block.start(), Tag::Bytes);
        texts += mark_text(image, config, map, &block);
    }

    texts
}
