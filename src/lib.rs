//! Two-pass assembler for the KH 32-bit instruction set.
//!
//! Pass 1 encodes one word per instruction and records labels; label
//! operands are left as zero and queued. Pass 2 patches them once every
//! label is known.

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod instructions;
pub mod operand;
pub mod parser;

pub use assembler::{assemble, assemble_with, AsmConfig, Assembler, Program};
pub use error::{AsmError, ErrorKind};
