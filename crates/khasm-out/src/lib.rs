//! Serializers for a resolved [`Program`].

use std::io::{self, Write};

use khasm::Program;
use serde::{Deserialize, Serialize};

/// `"{addr:x} {word:x}"`, one line per address.
pub fn write_listing<W: Write>(out: &mut W, program: &Program) -> io::Result<()> {
    for (addr, word) in program.iter() {
        writeln!(out, "{addr:x} {word:x}")?;
    }
    Ok(())
}

/// Xilinx COE memory initialization file, radix 2.
pub fn write_coe<W: Write>(out: &mut W, program: &Program) -> io::Result<()> {
    writeln!(out, "memory_initialization_radix=2;")?;
    writeln!(out, "memory_initialization_vector=")?;
    for (_, word) in program.iter() {
        writeln!(out, "{word:032b},")?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, program: &Program) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, program)?;
    writeln!(out)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelKV {
    pub addr: u32,
    pub name: String,
}

/// Label table sorted by address, then name.
pub fn label_list(program: &Program) -> Vec<LabelKV> {
    let mut v: Vec<LabelKV> = program
        .labels
        .iter()
        .map(|(name, &addr)| LabelKV { addr, name: name.clone() })
        .collect();
    v.sort_by(|a, b| (a.addr, &a.name).cmp(&(b.addr, &b.name)));
    v
}
