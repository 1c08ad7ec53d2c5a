/*! SSA instruction graph for interprocedural data-flow analysis.
 *
 * The traversal engine needs a read-only program it can walk in both directions: operands for
 * definitions, users for consumers. This crate provides that graph as a frozen arena of
 * instructions, a fluent builder for hosts and tests, and one-line disassembly for reporting.
 */

pub mod builder;
pub mod format;
pub mod instructions;
pub mod program;
pub mod values;

pub use builder::{FunctionBuilder, ProgramBuilder};
pub use instructions::{
    BinaryOp, InstKind, Instruction, MemberOf, Opcode, SideEffectDecl, UnaryOp, UndefinedKind,
};
pub use program::Program;
pub use values::{Constant, InstId};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(InstId),
    #[error("Instruction {from} references missing instruction {to}")]
    InvalidReference { from: InstId, to: InstId },
    #[error("Builder error: {0}")]
    BuilderError(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
