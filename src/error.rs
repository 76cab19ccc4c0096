use serde::{Deserialize, Serialize};

/// Cause of an assembly failure, without source position.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("syntax error: {text:?}")]
    Syntax { text: String },
    #[error("unknown instruction `{mnemonic}`")]
    UnknownInstruction { mnemonic: String },
    #[error("`{mnemonic}` takes {expected} argument(s), got {actual}")]
    ArgumentCount {
        mnemonic: String,
        expected: usize,
        actual: usize,
    },
    #[error("bad register `{token}` (expected r0..r15)")]
    RegisterRange { token: String },
    #[error("immediate `{token}` does not fit in a signed {bits}-bit field")]
    ImmediateRange { token: String, bits: u32 },
    #[error("invalid immediate `{token}`")]
    InvalidImmediate { token: String },
    #[error("undefined label `{label}`")]
    UndefinedLabel { label: String },
    #[error("label `{label}` already defined at line {first_line}")]
    DuplicateLabel { label: String, first_line: usize },
}

/// An [`ErrorKind`] tagged with the 1-based source line it came from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("line {line}: {kind}")]
pub struct AsmError {
    pub line: usize,
    pub kind: ErrorKind,
}

impl AsmError {
    pub fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}
