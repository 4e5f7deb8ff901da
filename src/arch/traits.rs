//! Decoder trait

use crate::analysis::Instruction;
use crate::memory::Image;

/// Trait which represents the instruction decoding an architecture must
/// provide in order to be classified.
pub trait Decoder {
    /// Statically decode the instruction at `address`.
    ///
    /// The instruction yielded must not extend past `limit`. If the
    /// instruction at `address` would, decoders must instead yield a one-byte
    /// pseudo-instruction describing the byte as data. Every instruction is
    /// at least one byte long, so callers can always make progress.
    fn decode(&self, image: &Image, address: u32, limit: u32) -> Instruction;

    /// Decode successive instructions from `start` up to `limit`.
    fn iter<'a>(&'a self, image: &'a Image, start: u32, limit: u32) -> Instructions<'a, Self>
    where
        Self: Sized,
    {
        Instructions {
            decoder: self,
            image,
            pc: start,
            limit,
        }
    }
}

/// Iterator over a linear sweep of instructions.
pub struct Instructions<'a, D> {
    decoder: &'a D,
    image: &'a Image,
    pc: u32,
    limit: u32,
}

impl<'a, D> Iterator for Instructions<'a, D>
where
    D: Decoder,
{
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        if self.pc >= self.limit {
            return None;
        }

        let instr = self.decoder.decode(self.image, self.pc, self.limit);
        self.pc = instr.end();

        Some(instr)
    }
}
