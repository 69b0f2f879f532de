use analysis::solvers::DataflowError;
use thiserror::Error;

use crate::ir::{TypeId, ValueId};
use crate::raw::{RawRef, RawTypeRef, ValueTag};

/// Reasons the translation of a raw IR table can fail. None of these happen
/// for well formed input coming from a working reader, so the translation
/// aborts at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The reader could not produce a table. The message is the reader's own.
    #[error("{0}")]
    Reader(String),
    #[error("return instruction with {count} operands")]
    TooManyReturnValues { count: usize },
    #[error("branch instruction with {count} operands")]
    MalformedBranch { count: usize },
    #[error("switch instruction with {count} operands")]
    MalformedSwitch { count: usize },
    #[error("indirect branch instruction with {count} operands")]
    MalformedIndirectBranch { count: usize },
    #[error("invalid number of operands for {opcode:?}: {count}")]
    InvalidArity { opcode: ValueTag, count: usize },
    #[error("invalid {kind} comparison predicate {code}")]
    InvalidPredicate { kind: &'static str, code: u32 },
    /// A non-constant operand that was never registered while walking the
    /// module, so there is nothing to tie the reference to.
    #[error("could not resolve the reference to non-constant value {key}")]
    KnotTyingFailure { key: RawRef },
    #[error("{tag:?} {key} is not a registered global of the module")]
    DirectGlobalReference { key: RawRef, tag: ValueTag },
    #[error("duplicate record key {0}")]
    DuplicateKey(RawRef),
    #[error("duplicate type key {0}")]
    DuplicateType(RawTypeRef),
    #[error("reference to unknown record {0}")]
    UnknownValue(RawRef),
    #[error("reference to unknown type {0}")]
    UnknownType(RawTypeRef),
    #[error("type {key} is a bare reference")]
    MalformedType { key: RawTypeRef },
    #[error("upward type reference {level} has no enclosing type")]
    UnresolvedUpref { level: u32 },
    #[error("record {key} tagged {tag:?} carries an unexpected payload")]
    UnexpectedPayload { key: RawRef, tag: ValueTag },
    #[error("constant {0} refers to itself")]
    ConstantCycle(RawRef),
    #[error("value {0:?} was registered but never translated")]
    Untranslated(ValueId),
    #[error("type {0:?} was registered but never translated")]
    UntranslatedType(TypeId),
}

/// Failures of the analyses built on top of the IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("value {0:?} is not a function")]
    NotAFunction(ValueId),
    #[error("function {0:?} has no body")]
    Declaration(ValueId),
    #[error(transparent)]
    Dataflow(#[from] DataflowError),
}
