use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::encoder::{Backpatch, Encoder};
use crate::error::{AsmError, ErrorKind};
use crate::operand::{fit_signed, patch_bits};
use crate::parser::parse_line;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsmConfig {
    /// Let a later `name:` silently replace an earlier one.
    pub allow_redefinition: bool,
}

/// Fully resolved output: one word per address, addresses dense from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub words: Vec<u32>,
    pub labels: BTreeMap<String, u32>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, address: u32) -> Option<u32> {
        self.words.get(address as usize).copied()
    }

    /// `(address, word)` pairs in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0u32..).zip(self.words.iter().copied())
    }
}

#[derive(Debug, Clone, Copy)]
struct LabelDef {
    address: u32,
    line: usize,
}

/// Pass-1 state for one source file. Feed lines in order, then [`finish`].
///
/// A line either applies completely or not at all. After the first error
/// every later `feed` and `finish` returns that same error.
///
/// [`finish`]: Assembler::finish
#[derive(Debug, Default)]
pub struct Assembler {
    cfg: AsmConfig,
    code: Vec<u32>,
    labels: HashMap<String, LabelDef>,
    pending: Vec<Backpatch>,
    line: usize,
    failed: Option<AsmError>,
}

impl Assembler {
    pub fn new(cfg: AsmConfig) -> Self {
        Self { cfg, ..Self::default() }
    }

    /// Address the next encoded instruction will occupy.
    pub fn pc(&self) -> u32 {
        self.code.len() as u32
    }

    /// Runs pass 1 over the next source line.
    pub fn feed(&mut self, text: &str) -> Result<(), AsmError> {
        if let Some(e) = &self.failed {
            return Err(e.clone());
        }
        self.line += 1;
        let line = self.line;
        self.step(text).map_err(|kind| {
            let e = AsmError::new(line, kind);
            self.failed = Some(e.clone());
            e
        })
    }

    fn step(&mut self, text: &str) -> Result<(), ErrorKind> {
        let stmt = parse_line(text)?;
        if stmt.is_empty() {
            return Ok(());
        }
        let pc = self.pc();
        if let Some(name) = stmt.label {
            self.check_label(name)?;
        }
        let mut queued = Vec::new();
        let word = match stmt.mnemonic {
            Some(mnemonic) => {
                let word = Encoder::new(pc, self.line, &mut queued).encode(mnemonic, &stmt.args)?;
                trace!(pc, word, mnemonic, "encoded");
                Some(word)
            }
            None => None,
        };

        if let Some(name) = stmt.label {
            debug!(label = name, address = pc, "define label");
            self.labels.insert(name.to_string(), LabelDef { address: pc, line: self.line });
        }
        self.code.extend(word);
        self.pending.append(&mut queued);
        Ok(())
    }

    fn check_label(&self, name: &str) -> Result<(), ErrorKind> {
        match self.labels.get(name) {
            Some(prev) if !self.cfg.allow_redefinition => Err(ErrorKind::DuplicateLabel {
                label: name.to_string(),
                first_line: prev.line,
            }),
            Some(prev) => {
                debug!(label = name, old = prev.address, "label redefined");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Pass 2: resolves every queued label operand and returns the program.
    pub fn finish(mut self) -> Result<Program, AsmError> {
        if let Some(e) = self.failed.take() {
            return Err(e);
        }
        for bp in std::mem::take(&mut self.pending) {
            let target = self.labels.get(&bp.label).map(|d| d.address).ok_or_else(|| {
                AsmError::new(bp.line, ErrorKind::UndefinedLabel { label: bp.label.clone() })
            })?;
            let value = if bp.relative {
                i64::from(target) - (i64::from(bp.address) + 1)
            } else {
                i64::from(target)
            };
            if fit_signed(value, bp.bits).is_none() {
                warn!(
                    line = bp.line,
                    label = %bp.label,
                    value,
                    bits = bp.bits,
                    "resolved value truncated to field"
                );
            }
            let slot = &mut self.code[bp.address as usize];
            *slot = patch_bits(*slot, value, bp.bits);
            debug!(address = bp.address, label = %bp.label, value, "backpatched");
        }
        let labels = self.labels.into_iter().map(|(name, def)| (name, def.address)).collect();
        Ok(Program { words: self.code, labels })
    }
}

/// Assembles a whole source text with the default configuration.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    assemble_with(source, AsmConfig::default())
}

pub fn assemble_with(source: &str, cfg: AsmConfig) -> Result<Program, AsmError> {
    let mut asm = Assembler::new(cfg);
    for line in source.lines() {
        asm.feed(line)?;
    }
    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_record_next_address() {
        let p = assemble("start:\n  nop\nmid: nop\nend:").unwrap();
        assert_eq!(p.words, vec![0, 0]);
        assert_eq!(p.labels["start"], 0);
        assert_eq!(p.labels["mid"], 1);
        assert_eq!(p.labels["end"], 2);
    }

    #[test]
    fn pc_advances_once_per_instruction() {
        let mut asm = Assembler::new(AsmConfig::default());
        asm.feed("; header").unwrap();
        assert_eq!(asm.pc(), 0);
        asm.feed("a: add r1, r2, r3").unwrap();
        asm.feed("").unwrap();
        asm.feed("b:").unwrap();
        assert_eq!(asm.pc(), 1);
        asm.feed("ret").unwrap();
        assert_eq!(asm.pc(), 2);
    }

    #[test]
    fn backward_branch_is_negative() {
        let p = assemble("top: nop\nnop\nbne top").unwrap();
        // 0 - (2 + 1) = -3
        assert_eq!(p.get(2), Some(0x42FF_FFFD));
    }

    #[test]
    fn absolute_label_operand_keeps_other_fields() {
        let p = assemble("movi r7, data\naddi r1, r2, data\nnop\ndata: nop").unwrap();
        assert_eq!(p.get(0), Some(0x0870_0003));
        assert_eq!(p.get(1), Some(0x1812_0003));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let e = assemble("nop\n\nmov r1\n").unwrap_err();
        assert_eq!(e.line, 3);
        assert!(matches!(e.kind, ErrorKind::ArgumentCount { expected: 2, actual: 1, .. }));

        let e = assemble("nop\nbeq nowhere\nnop").unwrap_err();
        assert_eq!(e, AsmError::new(2, ErrorKind::UndefinedLabel { label: "nowhere".into() }));
    }

    #[test]
    fn redefinition_policy() {
        let src = "x: nop\nx: nop\nbal x";
        let e = assemble(src).unwrap_err();
        let dup = ErrorKind::DuplicateLabel { label: "x".into(), first_line: 1 };
        assert_eq!(e, AsmError::new(2, dup));

        let p = assemble_with(src, AsmConfig { allow_redefinition: true }).unwrap();
        assert_eq!(p.labels["x"], 1);
        // 1 - (2 + 1) = -2
        assert_eq!(p.get(2), Some(0x4FFF_FFFE));
    }

    #[test]
    fn two_labels_same_address() {
        let p = assemble("a:\nb: nop").unwrap();
        assert_eq!(p.labels["a"], 0);
        assert_eq!(p.labels["b"], 0);
    }

    #[test]
    fn oversized_displacement_is_truncated() {
        // 5-bit shift field given a label resolving to 20
        let mut src = String::from("shl r1, r1, far\n");
        src.push_str(&"nop\n".repeat(19));
        src.push_str("far: nop\n");
        let p = assemble(&src).unwrap();
        assert_eq!(p.get(0), Some(0x2711_0014));
    }

    #[test]
    fn wide_absolute_label_is_truncated_to_imm16() {
        // far = 40001 = 0x9C41, above the signed 16-bit maximum
        let mut src = String::from("movi r1, far\n");
        src.push_str(&"nop\n".repeat(40_000));
        src.push_str("far: nop\n");
        let p = assemble(&src).unwrap();
        assert_eq!(p.labels["far"], 40_001);
        assert_eq!(p.get(0), Some(0x0810_9C41));
    }

    #[test]
    fn failed_line_leaves_no_state() {
        let mut asm = Assembler::new(AsmConfig::default());
        asm.feed("nop").unwrap();
        let e = asm.feed("x: frob r1").unwrap_err();
        assert_eq!(e, AsmError::new(2, ErrorKind::UnknownInstruction { mnemonic: "frob".into() }));
        assert_eq!(asm.pc(), 1);
        assert!(asm.labels.is_empty());
        assert!(asm.pending.is_empty());

        // no continuing past the first error
        assert_eq!(asm.feed("bal x"), Err(e.clone()));
        assert_eq!(asm.finish(), Err(e));
    }

    #[test]
    fn label_kept_out_when_operand_fails() {
        let mut asm = Assembler::new(AsmConfig::default());
        let e = asm.feed("top: movi r1, 99999").unwrap_err();
        assert!(matches!(e.kind, ErrorKind::ImmediateRange { bits: 16, .. }));
        assert!(asm.labels.is_empty());
        assert!(asm.code.is_empty());
    }
}
