//! Analysis of instruction control flow

/// Indicates what kind of control flow a particular instruction involves.
///
/// Control flow determines in what order instructions are executed. This
/// implies the notion of a "next" instruction, present directly after the
/// given instruction, and zero or more alternative instructions. Calls are
/// assumed to return, and so count as `Normal` flow.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Normal control flow.
    ///
    /// Instruction control predictably flows from the current instruction to
    /// the following instruction.
    Normal,

    /// Branching control flow.
    ///
    /// Instruction control diverges at this point. The boolean parameter
    /// indicates whether or not the following instruction is one of the
    /// possible continuations (i.e. the branch is conditional).
    Branching(bool),

    /// Returning control flow.
    ///
    /// Instruction control flow for this subroutine ends.
    Returning,
}

impl Flow {
    /// Determine if execution may continue at the following instruction.
    pub fn is_nonfinal(self) -> bool {
        use Flow::*;

        match self {
            Normal => true,
            Branching(with_next) => with_next,
            Returning => false,
        }
    }

    /// A terminal instruction is one after which static control flow cannot
    /// be assumed to fall through: unconditional returns and jumps.
    pub fn is_terminal(self) -> bool {
        !self.is_nonfinal()
    }
}
