//! The Zilog Z80, as found in the ZX Spectrum

mod dis;
mod types;

pub use dis::{disassemble, DEFB_CLASS};
pub use types::*;
