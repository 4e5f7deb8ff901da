//! Types used in modeling the Z80

use crate::analysis::Instruction;
use crate::arch::z80::disassemble;
use crate::arch::Decoder;
use crate::memory::Image;
use std::collections::BTreeMap;

/// The two encodings of loading H or L through `(hl)`, which legitimately
/// appear twice in a row when dereferencing a pointer table.
pub static HL_INDIRECT_LOADS: [u8; 2] = [0x66, 0x6E];

lazy_static! {
    /// Built-in repeat ceilings, keyed by opcode class.
    static ref DEFAULT_CEILINGS: BTreeMap<u32, i32> = {
        let mut ceilings = BTreeMap::new();

        //ld r,r for the same register does nothing; a few in a row are filler
        for reg in 0..8u32 {
            if reg != 6 {
                ceilings.insert(0x40 | reg << 3 | reg, 3);
            }
        }

        //halt
        ceilings.insert(0x76, 2);

        //rst $38, the usual reading of uninitialised ($FF) memory
        ceilings.insert(0xFF, 2);

        ceilings
    };
}

/// The maximum number of consecutive identical instructions considered
/// plausible as real code, per opcode class.
///
/// Classes without an entry have no ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatCeilings {
    ceilings: BTreeMap<u32, i32>,
}

impl Default for RepeatCeilings {
    fn default() -> Self {
        RepeatCeilings {
            ceilings: DEFAULT_CEILINGS.clone(),
        }
    }
}

impl RepeatCeilings {
    /// A table with no ceilings at all.
    pub fn none() -> Self {
        RepeatCeilings {
            ceilings: BTreeMap::new(),
        }
    }

    pub fn ceiling(&self, class: u32) -> i32 {
        self.ceilings.get(&class).copied().unwrap_or(0)
    }

    pub fn set(&mut self, class: u32, ceiling: i32) {
        self.ceilings.insert(class, ceiling);
    }

    /// Replace the ceilings of some classes, leaving the rest alone.
    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (u32, i32)>,
    {
        for (class, ceiling) in overrides {
            self.set(class, ceiling);
        }

        self
    }
}

/// The Zilog Z80.
#[derive(Clone, Debug, Default)]
pub struct Z80 {
    ceilings: RepeatCeilings,
}

impl Z80 {
    pub fn new(ceilings: RepeatCeilings) -> Self {
        Z80 { ceilings }
    }

    pub fn ceilings(&self) -> &RepeatCeilings {
        &self.ceilings
    }
}

impl Decoder for Z80 {
    fn decode(&self, image: &Image, address: u32, limit: u32) -> Instruction {
        disassemble(image, address, limit, &self.ceilings)
    }
}
