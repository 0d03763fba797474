//! A word machine: a 32 bit processor with word addressed memory and a double
//! buffered graphics unit, plus an assembler producing its binary programs.

pub mod assembler;
pub mod error;
pub mod graphics;
pub mod isa;
pub mod machine;
pub mod memory;
pub mod processor;
pub mod register;
