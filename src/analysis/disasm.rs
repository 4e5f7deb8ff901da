//! Disassembly results, and the referrer-aware view built over a tag map

use crate::analysis::{Block, Flow, Reference, ReferenceKind, Tag, TagMap};
use crate::arch::Decoder;
use crate::memory::Image;
use std::collections::BTreeMap;

/// A single decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    address: u32,

    /// The encoded bytes of the instruction, prefixes included.
    bytes: Vec<u8>,

    /// Prefix and opcode bytes with operands stripped. Two instructions share
    /// a class if they differ only in their immediates or displacements.
    class: u32,

    /// How many identical instructions in a row are plausible as real code.
    /// Zero or negative means there is no ceiling.
    ceiling: i32,

    flow: Flow,

    /// Statically known jump or call target.
    target: Option<u32>,

    mnemonic: String,
}

impl Instruction {
    pub fn new(
        address: u32,
        bytes: Vec<u8>,
        class: u32,
        ceiling: i32,
        flow: Flow,
        target: Option<u32>,
        mnemonic: String,
    ) -> Self {
        Instruction {
            address,
            bytes,
            class,
            ceiling,
            flow,
            target,
            mnemonic,
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// The address directly after this instruction.
    pub fn end(&self) -> u32 {
        self.address + self.size()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn class(&self) -> u32 {
        self.class
    }

    pub fn ceiling(&self) -> i32 {
        self.ceiling
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn is_terminal(&self) -> bool {
        self.flow.is_terminal()
    }

    /// The literal target of a `jp` or `jr`, conditional or not.
    pub fn jump_target(&self) -> Option<u32> {
        if self.mnemonic.starts_with("jp ") || self.mnemonic.starts_with("jr ") {
            self.target
        } else {
            None
        }
    }

    pub fn reference_kind(&self) -> ReferenceKind {
        match self.flow {
            Flow::Branching(_) => ReferenceKind::Code,
            _ => ReferenceKind::Subroutine,
        }
    }
}

/// One block of the tag map, together with the instructions it decodes to.
#[derive(Clone, Debug)]
pub struct Entry {
    block: Block,
    instructions: Vec<Instruction>,
}

impl Entry {
    pub fn tag(&self) -> Tag {
        self.block.tag()
    }

    pub fn start(&self) -> u32 {
        self.block.start()
    }

    pub fn end(&self) -> u32 {
        self.block.end()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }
}

/// A disassembly of every block in a tag map, with an index of which
/// instructions branch to or call each address.
///
/// The view is a snapshot. Once the map it was built from changes, build a
/// new one.
pub struct Disassembly {
    entries: Vec<Entry>,
    referrers: BTreeMap<u32, Vec<Reference>>,
}

impl Disassembly {
    pub fn build<D>(image: &Image, decoder: &D, map: &TagMap) -> Self
    where
        D: Decoder,
    {
        let mut entries = Vec::new();
        let mut referrers: BTreeMap<u32, Vec<Reference>> = BTreeMap::new();

        for block in map.blocks() {
            let instructions: Vec<Instruction> =
                decoder.iter(image, block.start(), block.end()).collect();

            for instr in instructions.iter() {
                if let Some(target) = instr.target() {
                    referrers.entry(target).or_default().push(Reference::new_static_ref(
                        instr.address(),
                        target,
                        instr.reference_kind(),
                        block.tag(),
                    ));
                }
            }

            entries.push(Entry {
                block,
                instructions,
            });
        }

        Disassembly { entries, referrers }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The entry following the one at `index`.
    pub fn next(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index + 1)
    }

    /// Every instruction which statically branches to or calls `addr`.
    pub fn referrers(&self, addr: u32) -> &[Reference] {
        self.referrers
            .get(&addr)
            .map(|refs| refs.as_slice())
            .unwrap_or(&[])
    }

    /// The first reference to `addr` made from inside a code block.
    pub fn code_referrer(&self, addr: u32) -> Option<&Reference> {
        self.referrers(addr)
            .iter()
            .find(|r| r.source_tag() == Tag::Code)
    }
}
