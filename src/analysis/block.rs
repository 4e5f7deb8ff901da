//! Classification tags and the blocks they describe

use serde::{Deserialize, Serialize};
use std::fmt;

/// The classification of a block of memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Executable code.
    #[serde(rename = "c")]
    Code,

    /// Byte (or word) data.
    #[serde(rename = "b")]
    Bytes,

    /// Text.
    #[serde(rename = "t")]
    Text,

    /// Zero fill.
    #[serde(rename = "s")]
    Zero,

    /// Exclusive end of the classified range. Not a real block.
    #[serde(rename = "i")]
    End,

    /// Not yet classified.
    ///
    /// Only ever present while a synthesis run is in progress; every unknown
    /// block is resolved to a concrete tag before a map is handed back.
    #[serde(rename = "U")]
    Unknown,
}

impl Tag {
    pub fn as_char(self) -> char {
        match self {
            Tag::Code => 'c',
            Tag::Bytes => 'b',
            Tag::Text => 't',
            Tag::Zero => 's',
            Tag::End => 'i',
            Tag::Unknown => 'U',
        }
    }

    /// Byte data and zero fill are interchangeable when merging data blocks.
    pub fn is_data(self) -> bool {
        matches!(self, Tag::Bytes | Tag::Zero)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A half-open span of memory `[start, end)` sharing a single tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    start: u32,
    end: u32,
    tag: Tag,
}

impl Block {
    pub fn from_parts(start: u32, end: u32, tag: Tag) -> Self {
        Block { start, end, tag }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.start <= addr && addr < self.end
    }
}
