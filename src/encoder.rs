use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ErrorKind;
use crate::instructions::{lookup, Category};
use crate::operand::{immediate, put_field, register_index, Immediate};

/// Bit field as (lsb, width). All categories share these positions.
type Field = (u32, u32);

const OPCODE: Field = (24, 8);
const DEST: Field = (20, 4);
const SRC: Field = (16, 4);
const REG_B: Field = (12, 4);
const IMM16: Field = (0, 16);
const SHIFT5: Field = (0, 5);
const DISP24: Field = (0, 24);

/// A label operand waiting for pass 2. The field always starts at bit 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backpatch {
    pub address: u32,
    /// Source line that queued the entry, kept for diagnostics.
    pub line: usize,
    pub label: String,
    pub bits: u32,
    pub relative: bool,
}

/// Encodes instructions at one address, queueing label operands.
pub struct Encoder<'q> {
    address: u32,
    line: usize,
    queue: &'q mut Vec<Backpatch>,
}

impl<'q> Encoder<'q> {
    pub fn new(address: u32, line: usize, queue: &'q mut Vec<Backpatch>) -> Self {
        Self { address, line, queue }
    }

    /// Packs `mnemonic args..` into one word. Label operands are left zero.
    pub fn encode(&mut self, mnemonic: &str, args: &[&str]) -> Result<u32, ErrorKind> {
        let desc = lookup(mnemonic)
            .ok_or_else(|| ErrorKind::UnknownInstruction { mnemonic: mnemonic.to_string() })?;
        let expected = desc.category.arity();
        if args.len() != expected {
            return Err(ErrorKind::ArgumentCount {
                mnemonic: mnemonic.to_string(),
                expected,
                actual: args.len(),
            });
        }

        let w = put_field(0, OPCODE.0, OPCODE.1, u32::from(desc.opcode));
        let word = match desc.category {
            Category::N => w,
            Category::Da => {
                let w = reg(w, args[0], DEST)?;
                reg(w, args[1], SRC)?
            }
            Category::Di => {
                let w = reg(w, args[0], DEST)?;
                self.imm(w, args[1], IMM16, false)?
            }
            Category::Dai => {
                let w = reg(w, args[0], DEST)?;
                let w = reg(w, args[1], SRC)?;
                self.imm(w, args[2], IMM16, false)?
            }
            Category::Dab => {
                let w = reg(w, args[0], DEST)?;
                let w = reg(w, args[1], SRC)?;
                reg(w, args[2], REG_B)?
            }
            Category::Das => {
                let w = reg(w, args[0], DEST)?;
                let w = reg(w, args[1], SRC)?;
                self.imm(w, args[2], SHIFT5, false)?
            }
            Category::Ab => {
                let w = reg(w, args[0], SRC)?;
                reg(w, args[1], REG_B)?
            }
            Category::Ai => {
                let w = reg(w, args[0], SRC)?;
                self.imm(w, args[1], IMM16, false)?
            }
            Category::I24 => self.imm(w, args[0], DISP24, true)?,
            Category::A => reg(w, args[0], SRC)?,
            Category::D => reg(w, args[0], DEST)?,
        };
        Ok(word)
    }

    fn imm(
        &mut self,
        word: u32,
        token: &str,
        (lsb, bits): Field,
        relative: bool,
    ) -> Result<u32, ErrorKind> {
        match immediate(token, bits)? {
            Immediate::Value(v) => Ok(put_field(word, lsb, bits, v)),
            Immediate::Label(label) => {
                debug!(address = self.address, label, bits, relative, "queue backpatch");
                self.queue.push(Backpatch {
                    address: self.address,
                    line: self.line,
                    label: label.to_string(),
                    bits,
                    relative,
                });
                Ok(word)
            }
        }
    }
}

fn reg(word: u32, token: &str, (lsb, bits): Field) -> Result<u32, ErrorKind> {
    Ok(put_field(word, lsb, bits, register_index(token)?))
}
