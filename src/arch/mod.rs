//! Instruction decoders that classification can run over.
//!
//! Classification itself is architecture-neutral: it needs only a `Decoder`
//! that turns bytes at an address into an `analysis::Instruction`. The
//! only architecture that ships with zxmap is the Z80.

pub mod z80;

mod traits;

pub use traits::{Decoder, Instructions};
