use std::fmt;

use thiserror::Error;

use crate::memory::Word;

/// The address space an out of bounds access happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Register,
    Memory,
    Framebuffer,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Register => f.write_str("register"),
            Domain::Memory => f.write_str("memory"),
            Domain::Framebuffer => f.write_str("framebuffer"),
        }
    }
}

/// Fatal conditions raised while the machine executes.
///
/// There is no recovery path: a program is assumed correct once loaded, so
/// any of these ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("{domain} index `0x{index:x}` is out of bounds")]
    OutOfBounds { domain: Domain, index: u64 },
    #[error("opcode `0x{opcode:02X}` at `0x{address:x}` has no defined effect")]
    UnimplementedOpcode { opcode: Word, address: Word },
    #[error("graphics set needs a selection once a position is set")]
    PositionWithoutSelection,
    #[error("program image of {len} bytes is not a whole number of words")]
    MisalignedImage { len: usize },
}

impl MachineError {
    pub(crate) fn out_of_bounds<I: Into<u64>>(domain: Domain, index: I) -> Self {
        MachineError::OutOfBounds {
            domain,
            index: index.into(),
        }
    }
}

pub type Result<T, E = MachineError> = std::result::Result<T, E>;
