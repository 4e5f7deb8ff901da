//! Detection of data disguised as runs of identical instructions

use crate::analysis::Tag;
use crate::arch::z80::HL_INDIRECT_LOADS;

/// Determine if `count` consecutive copies of the instruction encoded as
/// `bytes` are too many to be real code.
///
/// Exactly two loads of H or L through `(hl)` are always allowed, whatever
/// the ceiling.
pub fn is_disguised_data(count: u32, ceiling: i32, bytes: &[u8]) -> bool {
    if ceiling <= 0 || (count as i64) < ceiling as i64 {
        return false;
    }

    let hl_idiom = bytes
        .first()
        .map_or(false, |op| HL_INDIRECT_LOADS.contains(op));

    !(count == 2 && hl_idiom)
}

/// Check a streak of identical instructions that ended at `addr`.
///
/// `pending` is where the block currently being built began, and `last` is
/// the tag of the boundary most recently emitted. If the streak is disguised
/// data, the pending block becomes data and the next one begins at `addr`.
///
/// Returns the boundary to emit, if any, and the new start of the pending
/// block.
pub fn catch_data(
    pending: u32,
    count: u32,
    ceiling: i32,
    addr: u32,
    bytes: &[u8],
    last: Option<Tag>,
) -> (Option<(u32, Tag)>, u32) {
    if !is_disguised_data(count, ceiling, bytes) {
        return (None, pending);
    }

    log::trace!(
        "{} x {:02X?} at ${:04X} is data",
        count,
        bytes,
        pending
    );

    if last == Some(Tag::Bytes) {
        (None, addr)
    } else {
        (Some((pending, Tag::Bytes)), addr)
    }
}
