//! Classification by static heuristics alone
//!
//! A linear sweep splits memory after every terminal instruction. Streaks of
//! identical instructions longer than their class allows are taken to be
//! data, then zero fill and text are split out of what remains.

use crate::analysis::passes::{mark_text, mark_text_in_code, mark_zero_fill};
use crate::analysis::{catch_data, Instruction, Tag, TagMap};
use crate::arch::Decoder;
use crate::memory::Image;
use crate::project::Config;
use std::collections::BTreeMap;

/// A run of consecutive instructions sharing an opcode class.
struct Streak {
    class: u32,
    ceiling: i32,
    bytes: Vec<u8>,
    count: u32,
}

impl Streak {
    fn begin(instr: &Instruction) -> Self {
        Streak {
            class: instr.class(),
            ceiling: instr.ceiling(),
            bytes: instr.bytes().to_vec(),
            count: 1,
        }
    }
}

/// Emit a data boundary if `streak`, ending at `addr`, is disguised data.
///
/// Returns the new start of the pending block.
fn check_streak(ctls: &mut Vec<(u32, Tag)>, pending: u32, streak: &Streak, addr: u32) -> u32 {
    let last = ctls.last().map(|(_, tag)| *tag);
    let (boundary, pending) = catch_data(
        pending,
        streak.count,
        streak.ceiling,
        addr,
        &streak.bytes,
        last,
    );

    if let Some(boundary) = boundary {
        ctls.push(boundary);
    }

    pending
}

/// Sweep `[start, end)` once, emitting a boundary for every block found.
pub(crate) fn sweep<D>(image: &Image, decoder: &D, start: u32, end: u32) -> TagMap
where
    D: Decoder,
{
    let mut ctls: Vec<(u32, Tag)> = Vec::new();
    let mut pending = start;
    let mut streak: Option<Streak> = None;

    for instr in decoder.iter(image, start, end) {
        match streak.as_mut() {
            Some(current) if current.class == instr.class() => current.count += 1,
            _ => {
                if let Some(previous) = streak.take() {
                    pending = check_streak(&mut ctls, pending, &previous, instr.address());
                }

                streak = Some(Streak::begin(&instr));
            }
        }

        if instr.is_terminal() {
            if let Some(current) = streak.take() {
                pending = check_streak(&mut ctls, pending, &current, instr.end());
            }

            if pending < instr.end() {
                ctls.push((pending, Tag::Code));
            }

            pending = instr.end();
        }
    }

    if pending < end {
        ctls.push((pending, Tag::Bytes));
    }

    let mut map: TagMap = ctls.into_iter().collect::<BTreeMap<_, _>>().into();
    map.insert(end, Tag::End);

    map
}

/// Turn the zero bytes leading any code block into zero fill.
pub(crate) fn split_leading_zeros(image: &Image, map: &mut TagMap) {
    for block in map.blocks_tagged(Tag::Code) {
        let zeros = image
            .slice(block.start(), block.end())
            .iter()
            .take_while(|b| **b == 0)
            .count() as u32;

        if zeros == 0 {
            continue;
        }

        map.insert(block.start(), Tag::Zero);

        if block.start() + zeros < block.end() {
            map.insert(block.start() + zeros, Tag::Code);
        }
    }
}

/// Join adjacent byte data and zero fill blocks into single data blocks.
///
/// A lone zero fill block is left as it is.
pub(crate) fn merge_data(map: &mut TagMap) {
    let boundaries: Vec<(u32, Tag)> = map.iter().collect();
    let mut previous: Option<(u32, Tag)> = None;

    for (addr, tag) in boundaries {
        match previous {
            Some((start, prev_tag)) if prev_tag.is_data() && tag.is_data() => {
                map.insert(start, Tag::Bytes);
                map.remove(addr);
                previous = Some((start, Tag::Bytes));
            }
            _ => previous = Some((addr, tag)),
        }
    }
}

/// Classify `[start, end)` of an image without an execution trace.
pub fn generate<D>(image: &Image, decoder: &D, config: &Config, start: u32, end: u32) -> TagMap
where
    D: Decoder,
{
    let mut map = sweep(image, decoder, start, end);
    log::debug!("Sweep found {} blocks", map.len() - 1);

    split_leading_zeros(image, &mut map);

    let zeros = mark_zero_fill(image, &mut map);
    log::debug!("Found {} zero fill blocks", zeros);

    merge_data(&mut map);

    let mut texts = 0;
    for block in map.blocks_tagged(Tag::Bytes) {
        texts += mark_text(image, config, &mut map, &block);
    }

    for block in map.blocks_tagged(Tag::Code) {
        texts += mark_text_in_code(image, config, &mut map, &block);
    }

    log::debug!("Found {} text blocks", texts);

    map
}
