use std::fmt::{self, Display};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::TranslationError;
use crate::ir::{CallingConvention, FloatKind, Linkage, Visibility};

/// Identity of a value record in the raw table, as handed out by the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRef(pub u64);

impl Display for RawRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a type record in the raw table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTypeRef(pub u64);

impl Display for RawTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// The discriminant of a value record. Determines the shape of the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueTag {
    // Top level entities and their parts.
    Function,
    GlobalVariable,
    Alias,
    Argument,
    BasicBlock,
    InlineAsm,

    // Constants.
    BlockAddress,
    ConstantAggregateZero,
    ConstantArray,
    ConstantStruct,
    ConstantVector,
    ConstantString,
    ConstantInt,
    ConstantFP,
    ConstantPointerNull,
    UndefValue,
    ConstantExpr,

    // Terminators.
    Ret,
    Br,
    Switch,
    IndirectBr,
    Invoke,
    Unwind,
    Unreachable,

    // Binary operators.
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    FRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,

    // Memory.
    Alloca,
    Load,
    Store,
    GetElementPtr,

    // Casts.
    Trunc,
    ZExt,
    SExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    FPTrunc,
    FPExt,
    PtrToInt,
    IntToPtr,
    BitCast,

    // Everything else.
    ICmp,
    FCmp,
    Phi,
    Call,
    Select,
    VaArg,
    ExtractElement,
    InsertElement,
    ShuffleVector,
    ExtractValue,
    InsertValue,
}

impl ValueTag {
    /// Constants can be translated on demand from any context.
    pub fn is_constant(self) -> bool {
        use ValueTag::*;
        matches!(
            self,
            BlockAddress
                | ConstantAggregateZero
                | ConstantArray
                | ConstantStruct
                | ConstantVector
                | ConstantString
                | ConstantInt
                | ConstantFP
                | ConstantPointerNull
                | UndefValue
                | ConstantExpr
                | InlineAsm
        )
    }

    /// Globals are only ever reached through the module's top level lists.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            ValueTag::Function | ValueTag::GlobalVariable | ValueTag::Alias
        )
    }

    pub fn is_instruction(self) -> bool {
        !self.is_constant()
            && !self.is_global()
            && !matches!(self, ValueTag::Argument | ValueTag::BasicBlock)
    }
}

/// A type as it appears in the raw table. Recursive types are broken either
/// by referring to another type record by key, or by an upward reference to
/// an enclosing type of the same tree: `Upref(0)` is the innermost type
/// currently being described.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawType {
    Void,
    Label,
    Metadata,
    Integer(u32),
    Float(FloatKind),
    Pointer {
        pointee: Box<RawType>,
        #[serde(default)]
        addr_space: u32,
    },
    Array {
        len: u64,
        elem: Box<RawType>,
    },
    Vector {
        len: u64,
        elem: Box<RawType>,
    },
    Function {
        ret: Box<RawType>,
        #[serde(default)]
        params: Vec<RawType>,
        #[serde(default)]
        vararg: bool,
    },
    Struct {
        fields: Vec<RawType>,
        #[serde(default)]
        packed: bool,
    },
    Named {
        name: String,
        inner: Box<RawType>,
    },
    Opaque(String),
    Ref(RawTypeRef),
    Upref(u32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTypeRecord {
    pub key: RawTypeRef,
    pub ty: RawType,
}

/// Source location attached to a value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLocation {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Fields of instructions and constant expressions. Which of them are
/// meaningful depends on the opcode; the rest keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInstruction {
    pub operands: Vec<RawRef>,
    /// Comparison predicate code.
    pub predicate: Option<u32>,
    pub in_bounds: bool,
    /// Constant indices of `extractvalue` and `insertvalue`.
    pub indices: Vec<u32>,
    pub volatile: bool,
    pub align: u32,
    pub addr_space: u32,
    pub calling_convention: CallingConvention,
    pub tail_call: bool,
    pub struct_return: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConstantExpr {
    pub opcode: ValueTag,
    #[serde(flatten)]
    pub instruction: RawInstruction,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConstant {
    /// Elements of aggregates, or `[function, block]` of a block address.
    pub operands: Vec<RawRef>,
    pub int_value: Option<i64>,
    pub float_value: Option<f64>,
    pub string_value: Option<String>,
    pub expr: Option<RawConstantExpr>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawArgument {
    pub sret: bool,
    pub byval: bool,
    pub nest: bool,
    pub noalias: bool,
    pub nocapture: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub instructions: Vec<RawRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGlobal {
    pub external: bool,
    pub align: u32,
    pub visibility: Visibility,
    pub linkage: Linkage,
    pub section: Option<String>,
    pub thread_local: bool,
    pub constant: bool,
    pub initializer: Option<RawRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlias {
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub linkage: Linkage,
    pub aliasee: RawRef,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFunction {
    pub external: bool,
    pub align: u32,
    pub visibility: Visibility,
    pub linkage: Linkage,
    pub section: Option<String>,
    pub calling_convention: CallingConvention,
    pub gc: Option<String>,
    pub arguments: Vec<RawRef>,
    pub blocks: Vec<RawRef>,
    pub vararg: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInlineAsm {
    pub asm: String,
    pub constraints: String,
    pub side_effects: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPayload {
    #[default]
    None,
    Instruction(RawInstruction),
    Constant(RawConstant),
    Argument(RawArgument),
    Block(RawBlock),
    Global(RawGlobal),
    Alias(RawAlias),
    Function(RawFunction),
    InlineAsm(RawInlineAsm),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawValue {
    pub key: RawRef,
    pub tag: ValueTag,
    #[serde(default)]
    pub name: Option<String>,
    pub ty: RawTypeRef,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub payload: RawPayload,
}

/// The flat table produced by a raw IR reader. Records refer to each other
/// only by key; nothing is linked yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawModule {
    pub identifier: String,
    pub data_layout: String,
    pub target_triple: String,
    pub inline_asm: String,
    /// Set by the reader when it failed to read the input.
    pub error: Option<String>,
    pub little_endian: bool,
    pub pointer_size: u32,
    pub types: Vec<RawTypeRecord>,
    pub values: Vec<RawValue>,
    pub globals: Vec<RawRef>,
    pub aliases: Vec<RawRef>,
    pub functions: Vec<RawRef>,
}

impl RawModule {
    pub fn from_json(text: &str) -> Result<Self, TranslationError> {
        serde_json::from_str(text).map_err(|err| TranslationError::Reader(err.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A source of raw tables. Reading consumes the reader, so whatever it holds
/// on to is released once the table is produced or the read failed.
pub trait RawReader {
    fn read(self) -> Result<RawModule, TranslationError>;
}

/// Reads the JSON encoding of a [`RawModule`].
pub struct JsonReader<R: Read> {
    source: R,
}

impl<R: Read> JsonReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: Read> RawReader for JsonReader<R> {
    fn read(self) -> Result<RawModule, TranslationError> {
        serde_json::from_reader(self.source)
            .map_err(|err| TranslationError::Reader(err.to_string()))
    }
}
