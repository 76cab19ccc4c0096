use serde::{Deserialize, Serialize};

/// Operand shape and bit layout of an instruction.
///
/// Letters name the fields: `D` destination register (bits 23..20),
/// `A` first source register (19..16), `B` second source register (15..12),
/// `I` signed 16-bit immediate (15..0), `S` signed 5-bit shift (4..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    N,
    Da,
    Di,
    Dai,
    Dab,
    Das,
    Ab,
    Ai,
    /// PC-relative 24-bit displacement (branches).
    I24,
    A,
    D,
}

impl Category {
    /// Number of comma-separated arguments the category takes.
    pub const fn arity(self) -> usize {
        match self {
            Category::N => 0,
            Category::I24 | Category::A | Category::D => 1,
            Category::Da | Category::Di | Category::Ab | Category::Ai => 2,
            Category::Dai | Category::Dab | Category::Das => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub category: Category,
}

impl InstrDesc {
    const fn new(mnemonic: &'static str, opcode: u8, category: Category) -> Self {
        Self { mnemonic, opcode, category }
    }
}

use Category::*;

pub const TABLE: &[InstrDesc] = &[
    InstrDesc::new("nop", 0x00, N),
    InstrDesc::new("mov", 0x00, Da),
    InstrDesc::new("mvn", 0x01, Da),
    InstrDesc::new("movi", 0x08, Di),
    InstrDesc::new("mvhi", 0x09, Dai),
    InstrDesc::new("mvli", 0x0A, Dai),
    // ALU, register operand
    InstrDesc::new("add", 0x10, Dab),
    InstrDesc::new("addf", 0x11, Dab),
    InstrDesc::new("sub", 0x12, Dab),
    InstrDesc::new("subf", 0x13, Dab),
    InstrDesc::new("and", 0x14, Dab),
    InstrDesc::new("or", 0x15, Dab),
    InstrDesc::new("xor", 0x16, Dab),
    InstrDesc::new("cmp", 0x17, Ab),
    // ALU, immediate operand
    InstrDesc::new("addi", 0x18, Dai),
    InstrDesc::new("addfi", 0x19, Dai),
    InstrDesc::new("subi", 0x1A, Dai),
    InstrDesc::new("subfi", 0x1B, Dai),
    InstrDesc::new("cmpi", 0x1F, Ai),
    InstrDesc::new("shl", 0x27, Das),
    InstrDesc::new("shr", 0x28, Das),
    InstrDesc::new("rol", 0x29, Das),
    InstrDesc::new("ror", 0x2A, Das),
    InstrDesc::new("asr", 0x2B, Das),
    InstrDesc::new("ldr", 0x30, Da),
    InstrDesc::new("str", 0x38, Da),
    // conditional branches: 0x40 | condition
    InstrDesc::new("bnt", 0x40, I24),
    InstrDesc::new("beq", 0x41, I24),
    InstrDesc::new("bne", 0x42, I24),
    InstrDesc::new("bcs", 0x43, I24),
    InstrDesc::new("bcc", 0x44, I24),
    InstrDesc::new("bmi", 0x45, I24),
    InstrDesc::new("bpl", 0x46, I24),
    InstrDesc::new("bvs", 0x47, I24),
    InstrDesc::new("bvc", 0x48, I24),
    InstrDesc::new("bhi", 0x49, I24),
    InstrDesc::new("bls", 0x4A, I24),
    InstrDesc::new("bge", 0x4B, I24),
    InstrDesc::new("blt", 0x4C, I24),
    InstrDesc::new("bgt", 0x4D, I24),
    InstrDesc::new("ble", 0x4E, I24),
    InstrDesc::new("bal", 0x4F, I24),
    InstrDesc::new("jp", 0x50, A),
    InstrDesc::new("jpl", 0x51, A),
    InstrDesc::new("ret", 0x58, N),
    InstrDesc::new("in", 0x60, D),
    InstrDesc::new("out", 0x68, Ab),
];

/// Alternate spellings, resolved before [`TABLE`] lookup.
pub const ALIASES: &[(&str, &str)] = &[("not", "mvn"), ("bhs", "bcs"), ("blo", "bcc")];

/// Maps an alias to its canonical mnemonic; anything else is returned as is.
pub fn canonical(mnemonic: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == mnemonic)
        .map_or(mnemonic, |&(_, target)| target)
}

/// Looks up a mnemonic (alias-resolved, case-sensitive).
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    let name = canonical(mnemonic);
    TABLE.iter().find(|d| d.mnemonic == name)
}
