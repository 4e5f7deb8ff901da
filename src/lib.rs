//! Code/data classification for Z80 memory images.
//!
//! Given a 64K memory image and, optionally, an execution trace, `zxmap`
//! divides the image into blocks of code, data, text and zero fill. The
//! resulting `analysis::TagMap` is what downstream disassembly tooling uses to
//! lay out a listing.

#[macro_use]
extern crate clap;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_plain;

pub mod analysis;
pub mod arch;
pub mod cli;
pub mod codemap;
pub mod memory;
pub mod project;
