//! Tools for classifying a memory image into code and data

mod block;
mod disasm;
mod flow;
mod heuristic;
mod map;
mod passes;
mod reference;
mod repeat;
mod synth;
mod terminal;
mod text;
mod traced;

pub use block::{Block, Tag};
pub use disasm::{Disassembly, Entry, Instruction};
pub use flow::Flow;
pub use map::TagMap;
pub use passes::fixpoint;
pub use reference::{Reference, ReferenceKind};
pub use repeat::{catch_data, is_disguised_data};
pub use synth::synthesize;
pub use terminal::find_terminal;
pub use text::{find_text, is_zero_fill, TextContext};

pub use heuristic::generate as generate_heuristic;
pub use traced::generate as generate_traced;

#[cfg(test)]
mod tests;
