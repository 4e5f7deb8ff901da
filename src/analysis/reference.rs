//! Types needed to analyze references

use crate::analysis::Tag;
use std::fmt::{Display, Formatter, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A jump, relative or absolute, conditional or not.
    Code,

    /// A call or restart.
    Subroutine,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ReferenceKind::Code => write!(f, "LOC"),
            ReferenceKind::Subroutine => write!(f, "FUN"),
        }
    }
}

/// A static branch or call from one instruction to another address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    from: u32,
    to: u32,
    reftype: ReferenceKind,

    /// The tag of the block the referring instruction lives in.
    from_tag: Tag,
}

impl Reference {
    pub fn new_static_ref(from: u32, to: u32, kind: ReferenceKind, from_tag: Tag) -> Self {
        Reference {
            from,
            to,
            reftype: kind,
            from_tag,
        }
    }

    pub fn as_source(&self) -> u32 {
        self.from
    }

    pub fn as_target(&self) -> u32 {
        self.to
    }

    pub fn kind(&self) -> ReferenceKind {
        self.reftype
    }

    pub fn source_tag(&self) -> Tag {
        self.from_tag
    }
}
