//! Finding the end of a run of code

use crate::analysis::{Tag, TagMap};
use crate::arch::Decoder;
use crate::memory::Image;

/// Decode forward from `start` until a terminal instruction or an existing
/// code boundary is found, never decoding past `end`.
///
/// When `tag` is `None`, boundaries falling strictly inside each decoded
/// instruction are removed from the map, as the run of code being traced
/// supersedes them; the tag of the first boundary removed this way is
/// remembered.
///
/// If the run reaches an address the map already tags as code, the scan stops
/// there and nothing is inserted. If it reaches a terminal instruction whose
/// end is below `end` and not already a boundary, that end is inserted into the
/// map with `tag`, or failing that the remembered tag. With neither, no
/// boundary is inserted.
///
/// Returns the address the scan stopped at.
pub fn find_terminal<D>(
    image: &Image,
    decoder: &D,
    map: &mut TagMap,
    start: u32,
    end: u32,
    tag: Option<Tag>,
) -> u32
where
    D: Decoder,
{
    let mut absorbed = None;
    let mut addr = start;

    while addr < end {
        let instr = decoder.decode(image, addr, end);
        let next = instr.end();

        if tag.is_none() {
            if let Some(removed) = map.remove_within(addr, next) {
                absorbed.get_or_insert(removed);
            }
        }

        if map.get(next) == Some(Tag::Code) {
            return next;
        }

        if instr.is_terminal() {
            if next < end && !map.contains(next) {
                if let Some(tag) = tag.or(absorbed) {
                    map.insert(next, tag);
                }
            }

            return next;
        }

        addr = next;
    }

    addr
}
