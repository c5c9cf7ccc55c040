//! Helix9: a balanced-ternary virtual machine. See `SPEC_FULL.md` at
//! the workspace root for the full component design.

pub mod assembler;
pub mod cognitive;
pub mod cpu;
pub mod error;
pub mod isa;
pub mod linker;
pub mod memory;
pub mod object;
pub mod trit;

pub use error::{AssembleError, CoreError, LinkError, Result};
pub use trit::TritWord;
