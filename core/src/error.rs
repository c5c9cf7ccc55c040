//! Error kinds the core must distinguish (see §7 of the specification).

use std::fmt;

/// A line/column position in assembler source, attached to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("{span}: duplicate label '{name}'")]
    DuplicateLabel { name: String, span: Span },
    #[error("{span}: unknown mnemonic '{text}'")]
    UnknownMnemonic { text: String, span: Span },
    #[error("{span}: malformed operand: {detail}")]
    MalformedOperand { detail: String, span: Span },
    #[error(".org directive at {span} may not move the offset backwards")]
    NonMonotonicOrg { span: Span },
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("duplicate global symbol '{name}'")]
    DuplicateGlobal { name: String },
    #[error("unresolved symbol '{name}'")]
    UnresolvedSymbol { name: String },
    #[error("malformed object file '{path}': {detail}")]
    MalformedObject { path: String, detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed input at line {line}: {detail}")]
    Malformed { line: usize, detail: String },
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Link(#[from] LinkError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
