use std::fmt::{self, Debug, Display};

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Unique identity of a value. It is also the index of the value in the
/// module's arena, assigned once in translation order and never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub usize);

impl ValueId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Half,
    Float,
    Double,
    X86Fp80,
    Fp128,
    PpcFp128,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Linkage {
    #[default]
    External,
    AvailableExternally,
    LinkOnceAny,
    LinkOnceOdr,
    WeakAny,
    WeakOdr,
    Appending,
    Internal,
    Private,
    ExternalWeak,
    Common,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Default,
    Hidden,
    Protected,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingConvention {
    #[default]
    C,
    Fast,
    Cold,
    Ghc,
    X86StdCall,
    X86FastCall,
    Other(u32),
}

/// Types are interned in the module and refer to each other by [`TypeId`],
/// which is how recursive types are represented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Void,
    Label,
    Metadata,
    Integer(u32),
    Float(FloatKind),
    Pointer { pointee: TypeId, addr_space: u32 },
    Array { len: u64, elem: TypeId },
    Vector { len: u64, elem: TypeId },
    Function { ret: TypeId, params: Vec<TypeId>, vararg: bool },
    Struct { fields: Vec<TypeId>, packed: bool },
    Named { name: String, inner: TypeId },
    Opaque(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub id: ValueId,
    pub name: Option<String>,
    pub ty: TypeId,
    pub location: Option<SourceLocation>,
    pub content: ValueContent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueContent {
    Function(Function),
    GlobalVariable(GlobalVariable),
    Alias(GlobalAlias),
    Argument(ParamAttributes),
    BasicBlock(BasicBlock),
    InlineAsm {
        asm: String,
        constraints: String,
        side_effects: bool,
    },
    Constant(Constant),
    Instruction(Instruction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub external: bool,
    pub align: u32,
    pub linkage: Linkage,
    pub visibility: Visibility,
    pub section: Option<String>,
    pub calling_convention: CallingConvention,
    pub gc: Option<String>,
    pub arguments: Vec<ValueId>,
    /// Empty for declarations.
    pub blocks: Vec<ValueId>,
    pub vararg: bool,
}

impl Function {
    pub fn entry_block(&self) -> Option<ValueId> {
        self.blocks.first().copied()
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalVariable {
    pub external: bool,
    pub align: u32,
    pub linkage: Linkage,
    pub visibility: Visibility,
    pub section: Option<String>,
    pub thread_local: bool,
    pub constant: bool,
    pub initializer: Option<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalAlias {
    pub linkage: Linkage,
    pub visibility: Visibility,
    pub aliasee: ValueId,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamAttributes {
    pub sret: bool,
    pub byval: bool,
    pub nest: bool,
    pub no_alias: bool,
    pub no_capture: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    pub instructions: Vec<ValueId>,
}

impl BasicBlock {
    pub fn first(&self) -> Option<ValueId> {
        self.instructions.first().copied()
    }

    /// The last instruction. Well formed blocks end with a terminator, which
    /// is not checked here.
    pub fn terminator(&self) -> Option<ValueId> {
        self.instructions.last().copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    AggregateZero,
    PointerNull,
    Undef,
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<ValueId>),
    Struct(Vec<ValueId>),
    Vector(Vec<ValueId>),
    BlockAddress { function: ValueId, block: ValueId },
    Expr(Box<Instruction>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
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
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
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
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl IntPredicate {
    /// Decodes the numbering used by LLVM, where integer predicates start at 32.
    pub fn from_code(code: u32) -> Option<Self> {
        use IntPredicate::*;
        Some(match code {
            32 => Eq,
            33 => Ne,
            34 => Ugt,
            35 => Uge,
            36 => Ult,
            37 => Ule,
            38 => Sgt,
            39 => Sge,
            40 => Slt,
            41 => Sle,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
    False,
    Oeq,
    Ogt,
    Oge,
    Olt,
    Ole,
    One,
    Ord,
    Uno,
    Ueq,
    Ugt,
    Uge,
    Ult,
    Ule,
    Une,
    True,
}

impl FloatPredicate {
    pub fn from_code(code: u32) -> Option<Self> {
        use FloatPredicate::*;
        const ALL: [FloatPredicate; 16] = [
            False, Oeq, Ogt, Oge, Olt, Ole, One, Ord, Uno, Ueq, Ugt, Uge, Ult, Ule, Une, True,
        ];
        ALL.get(code as usize).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub callee: ValueId,
    pub arguments: Vec<ValueId>,
    pub calling_convention: CallingConvention,
    pub tail_call: bool,
    pub struct_return: bool,
}

/// Operands refer to other values of the same module by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Ret(Option<ValueId>),
    Br(ValueId),
    CondBr {
        condition: ValueId,
        then_block: ValueId,
        else_block: ValueId,
    },
    Switch {
        value: ValueId,
        default: ValueId,
        cases: Vec<(ValueId, ValueId)>,
    },
    IndirectBr {
        address: ValueId,
        targets: Vec<ValueId>,
    },
    Invoke {
        call: CallSite,
        normal: ValueId,
        unwind: ValueId,
    },
    Unwind,
    Unreachable,
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    ICmp {
        predicate: IntPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    FCmp {
        predicate: FloatPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    Cast {
        op: CastOp,
        value: ValueId,
    },
    Alloca {
        count: Option<ValueId>,
        align: u32,
    },
    Load {
        address: ValueId,
        volatile: bool,
        align: u32,
    },
    Store {
        value: ValueId,
        address: ValueId,
        volatile: bool,
        align: u32,
        addr_space: u32,
    },
    GetElementPtr {
        in_bounds: bool,
        base: ValueId,
        indices: Vec<ValueId>,
    },
    Select {
        condition: ValueId,
        on_true: ValueId,
        on_false: ValueId,
    },
    VaArg {
        list: ValueId,
    },
    ExtractElement {
        vector: ValueId,
        index: ValueId,
    },
    InsertElement {
        vector: ValueId,
        element: ValueId,
        index: ValueId,
    },
    ShuffleVector {
        lhs: ValueId,
        rhs: ValueId,
        mask: ValueId,
    },
    ExtractValue {
        aggregate: ValueId,
        indices: Vec<u32>,
    },
    InsertValue {
        aggregate: ValueId,
        element: ValueId,
        indices: Vec<u32>,
    },
    /// Pairs of incoming value and the block it flows in from.
    Phi(Vec<(ValueId, ValueId)>),
    Call(CallSite),
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        use Instruction::*;
        matches!(
            self,
            Ret(_)
                | Br(_)
                | CondBr { .. }
                | Switch { .. }
                | IndirectBr { .. }
                | Invoke { .. }
                | Unwind
                | Unreachable
        )
    }

    /// The blocks control may flow to after this instruction.
    pub fn successor_blocks(&self) -> Vec<ValueId> {
        use Instruction::*;
        match self {
            Br(target) => vec![*target],
            CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Switch { default, cases, .. } => std::iter::once(*default)
                .chain(cases.iter().map(|(_, dest)| *dest))
                .collect(),
            IndirectBr { targets, .. } => targets.clone(),
            Invoke { normal, unwind, .. } => vec![*normal, *unwind],
            _ => Vec::new(),
        }
    }

    /// Every value this instruction refers to, in operand order.
    pub fn operands(&self) -> Vec<ValueId> {
        use Instruction::*;
        let call_operands = |call: &CallSite| {
            std::iter::once(call.callee)
                .chain(call.arguments.iter().copied())
                .collect::<Vec<_>>()
        };
        match self {
            Ret(value) => value.iter().copied().collect(),
            Br(target) => vec![*target],
            CondBr {
                condition,
                then_block,
                else_block,
            } => vec![*condition, *then_block, *else_block],
            Switch {
                value,
                default,
                cases,
            } => [*value, *default]
                .into_iter()
                .chain(cases.iter().flat_map(|(val, dest)| [*val, *dest]))
                .collect(),
            IndirectBr { address, targets } => std::iter::once(*address)
                .chain(targets.iter().copied())
                .collect(),
            Invoke {
                call,
                normal,
                unwind,
            } => {
                let mut operands = call_operands(call);
                operands.extend([*normal, *unwind]);
                operands
            }
            Unwind | Unreachable => Vec::new(),
            Binary { lhs, rhs, .. } | ICmp { lhs, rhs, .. } | FCmp { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            Cast { value, .. } => vec![*value],
            Alloca { count, .. } => count.iter().copied().collect(),
            Load { address, .. } => vec![*address],
            Store { value, address, .. } => vec![*value, *address],
            GetElementPtr { base, indices, .. } => std::iter::once(*base)
                .chain(indices.iter().copied())
                .collect(),
            Select {
                condition,
                on_true,
                on_false,
            } => vec![*condition, *on_true, *on_false],
            VaArg { list } => vec![*list],
            ExtractElement { vector, index } => vec![*vector, *index],
            InsertElement {
                vector,
                element,
                index,
            } => vec![*vector, *element, *index],
            ShuffleVector { lhs, rhs, mask } => vec![*lhs, *rhs, *mask],
            ExtractValue { aggregate, .. } => vec![*aggregate],
            InsertValue {
                aggregate, element, ..
            } => vec![*aggregate, *element],
            Phi(incoming) => incoming.iter().flat_map(|(val, block)| [*val, *block]).collect(),
            Call(call) => call_operands(call),
        }
    }

    pub fn opcode_name(&self) -> &'static str {
        use Instruction::*;
        match self {
            Ret(_) => "ret",
            Br(_) | CondBr { .. } => "br",
            Switch { .. } => "switch",
            IndirectBr { .. } => "indirectbr",
            Invoke { .. } => "invoke",
            Unwind => "unwind",
            Unreachable => "unreachable",
            Binary { op, .. } => match op {
                BinaryOp::Add => "add",
                BinaryOp::FAdd => "fadd",
                BinaryOp::Sub => "sub",
                BinaryOp::FSub => "fsub",
                BinaryOp::Mul => "mul",
                BinaryOp::FMul => "fmul",
                BinaryOp::UDiv => "udiv",
                BinaryOp::SDiv => "sdiv",
                BinaryOp::FDiv => "fdiv",
                BinaryOp::URem => "urem",
                BinaryOp::SRem => "srem",
                BinaryOp::FRem => "frem",
                BinaryOp::Shl => "shl",
                BinaryOp::LShr => "lshr",
                BinaryOp::AShr => "ashr",
                BinaryOp::And => "and",
                BinaryOp::Or => "or",
                BinaryOp::Xor => "xor",
            },
            ICmp { .. } => "icmp",
            FCmp { .. } => "fcmp",
            Cast { op, .. } => match op {
                CastOp::Trunc => "trunc",
                CastOp::ZExt => "zext",
                CastOp::SExt => "sext",
                CastOp::FPToUI => "fptoui",
                CastOp::FPToSI => "fptosi",
                CastOp::UIToFP => "uitofp",
                CastOp::SIToFP => "sitofp",
                CastOp::FPTrunc => "fptrunc",
                CastOp::FPExt => "fpext",
                CastOp::PtrToInt => "ptrtoint",
                CastOp::IntToPtr => "inttoptr",
                CastOp::BitCast => "bitcast",
            },
            Alloca { .. } => "alloca",
            Load { .. } => "load",
            Store { .. } => "store",
            GetElementPtr { .. } => "getelementptr",
            Select { .. } => "select",
            VaArg { .. } => "va_arg",
            ExtractElement { .. } => "extractelement",
            InsertElement { .. } => "insertelement",
            ShuffleVector { .. } => "shufflevector",
            ExtractValue { .. } => "extractvalue",
            InsertValue { .. } => "insertvalue",
            Phi(_) => "phi",
            Call(_) => "call",
        }
    }
}

impl Value {
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match &self.content {
            ValueContent::Instruction(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BasicBlock> {
        match &self.content {
            ValueContent::BasicBlock(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.content {
            ValueContent::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(
            self.content,
            ValueContent::Function(_) | ValueContent::GlobalVariable(_) | ValueContent::Alias(_)
        )
    }
}

/// A fully linked module. Values and types live in arenas owned by the
/// module and are never mutated after translation.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub identifier: String,
    pub data_layout: String,
    pub target_triple: String,
    pub inline_asm: String,
    pub little_endian: bool,
    pub pointer_size: u32,
    pub globals: Vec<ValueId>,
    pub aliases: Vec<ValueId>,
    pub functions: Vec<ValueId>,
    pub(crate) values: Vec<Value>,
    pub(crate) types: Vec<Type>,
    /// Instruction to block, block and argument to function.
    pub(crate) owners: FxHashMap<ValueId, ValueId>,
}

impl Module {
    /// Panics if `id` does not belong to this module.
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn type_of(&self, id: ValueId) -> &Type {
        self.ty(self.value(id).ty)
    }

    pub fn function(&self, id: ValueId) -> Option<&Function> {
        self.values.get(id.0)?.as_function()
    }

    pub fn block(&self, id: ValueId) -> Option<&BasicBlock> {
        self.values.get(id.0)?.as_block()
    }

    pub fn instruction(&self, id: ValueId) -> Option<&Instruction> {
        self.values.get(id.0)?.as_instruction()
    }

    pub fn function_by_name(&self, name: &str) -> Option<ValueId> {
        self.functions
            .iter()
            .copied()
            .find(|&id| self.value(id).name.as_deref() == Some(name))
    }

    /// Functions with a body.
    pub fn defined_functions(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.functions
            .iter()
            .copied()
            .filter(|&id| self.function(id).is_some_and(|f| !f.is_declaration()))
    }

    /// The block owning an instruction.
    pub fn block_of(&self, instruction: ValueId) -> Option<ValueId> {
        self.instruction(instruction)?;
        self.owners.get(&instruction).copied()
    }

    /// The function owning a block, an argument, or an instruction.
    pub fn function_of(&self, id: ValueId) -> Option<ValueId> {
        let owner = self.owners.get(&id).copied()?;
        if self.function(owner).is_some() {
            Some(owner)
        } else {
            self.owners.get(&owner).copied()
        }
    }

    /// Structural type equality. Recursive types are compared
    /// coinductively: a pair under comparison is assumed equal.
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        self.types_equal_assuming(a, b, &mut FxHashSet::default())
    }

    fn types_equal_assuming(
        &self,
        a: TypeId,
        b: TypeId,
        assumed: &mut FxHashSet<(TypeId, TypeId)>,
    ) -> bool {
        if a == b || !assumed.insert((a, b)) {
            return true;
        }
        let mut all_equal = |xs: &[TypeId], ys: &[TypeId]| {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(&x, &y)| self.types_equal_assuming(x, y, assumed))
        };
        match (self.ty(a), self.ty(b)) {
            (Type::Named { name: n1, .. }, Type::Named { name: n2, .. }) => n1 == n2,
            (Type::Opaque(n1), Type::Opaque(n2)) => n1 == n2,
            (
                Type::Pointer {
                    pointee: p1,
                    addr_space: s1,
                },
                Type::Pointer {
                    pointee: p2,
                    addr_space: s2,
                },
            ) => s1 == s2 && all_equal(&[*p1], &[*p2]),
            (Type::Array { len: l1, elem: e1 }, Type::Array { len: l2, elem: e2 })
            | (Type::Vector { len: l1, elem: e1 }, Type::Vector { len: l2, elem: e2 }) => {
                l1 == l2 && all_equal(&[*e1], &[*e2])
            }
            (
                Type::Function {
                    ret: r1,
                    params: p1,
                    vararg: v1,
                },
                Type::Function {
                    ret: r2,
                    params: p2,
                    vararg: v2,
                },
            ) => v1 == v2 && all_equal(&[*r1], &[*r2]) && all_equal(p1, p2),
            (
                Type::Struct {
                    fields: f1,
                    packed: k1,
                },
                Type::Struct {
                    fields: f2,
                    packed: k2,
                },
            ) => k1 == k2 && all_equal(f1, f2),
            (t1, t2) => t1 == t2,
        }
    }
}

/// A short reference to a value as it appears in operand position.
pub fn operand_name(module: &Module, id: ValueId) -> String {
    let value = module.value(id);
    let local = |sigil: char| match &value.name {
        Some(name) => format!("{sigil}{name}"),
        None => format!("{sigil}{}", id.0),
    };
    match &value.content {
        ValueContent::Function(_) | ValueContent::GlobalVariable(_) | ValueContent::Alias(_) => {
            local('@')
        }
        ValueContent::Argument(_) | ValueContent::BasicBlock(_) | ValueContent::Instruction(_) => {
            local('%')
        }
        ValueContent::InlineAsm { asm, .. } => format!("asm \"{asm}\""),
        ValueContent::Constant(constant) => print_constant(module, constant),
    }
}

fn print_constant(module: &Module, constant: &Constant) -> String {
    let list = |ids: &[ValueId]| ids.iter().map(|&id| operand_name(module, id)).join(", ");
    match constant {
        Constant::AggregateZero => "zeroinitializer".to_string(),
        Constant::PointerNull => "null".to_string(),
        Constant::Undef => "undef".to_string(),
        Constant::Int(value) => value.to_string(),
        Constant::Float(value) => format!("{value:?}"),
        Constant::String(text) => format!("c\"{}\"", text.escape_default()),
        Constant::Array(elements) => format!("[{}]", list(elements)),
        Constant::Struct(fields) => format!("{{{}}}", list(fields)),
        Constant::Vector(elements) => format!("<{}>", list(elements)),
        Constant::BlockAddress { function, block } => format!(
            "blockaddress({}, {})",
            operand_name(module, *function),
            operand_name(module, *block)
        ),
        Constant::Expr(inst) => format!("({})", print_instruction(module, inst)),
    }
}

fn print_instruction(module: &Module, inst: &Instruction) -> String {
    let mut result = inst.opcode_name().to_string();
    match inst {
        Instruction::ICmp { predicate, .. } => result += &format!(" {predicate:?}").to_lowercase(),
        Instruction::FCmp { predicate, .. } => result += &format!(" {predicate:?}").to_lowercase(),
        Instruction::GetElementPtr { in_bounds: true, .. } => result += " inbounds",
        Instruction::Load { volatile: true, .. } | Instruction::Store { volatile: true, .. } => {
            result += " volatile"
        }
        Instruction::Call(CallSite { tail_call: true, .. }) => result = format!("tail {result}"),
        _ => {}
    }
    let operands = inst.operands();
    if !operands.is_empty() {
        result += " ";
        result += &operands.iter().map(|&id| operand_name(module, id)).join(", ");
    }
    if let Instruction::ExtractValue { indices, .. } | Instruction::InsertValue { indices, .. } =
        inst
    {
        for index in indices {
            result += &format!(", {index}");
        }
    }
    result
}

/// One line textual form of a value, used as a label in graph renderings.
pub fn print_value(module: &Module, id: ValueId) -> String {
    let value = module.value(id);
    match &value.content {
        ValueContent::Instruction(inst) => {
            let text = print_instruction(module, inst);
            if matches!(module.ty(value.ty), Type::Void) {
                text
            } else {
                format!("{} = {text}", operand_name(module, id))
            }
        }
        ValueContent::BasicBlock(_) => format!("{}:", operand_name(module, id)),
        _ => operand_name(module, id),
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Label => write!(f, "label"),
            Type::Metadata => write!(f, "metadata"),
            Type::Integer(width) => write!(f, "i{width}"),
            Type::Float(kind) => write!(f, "{}", format!("{kind:?}").to_lowercase()),
            Type::Pointer { pointee, .. } => write!(f, "{pointee:?}*"),
            Type::Array { len, elem } => write!(f, "[{len} x {elem:?}]"),
            Type::Vector { len, elem } => write!(f, "<{len} x {elem:?}>"),
            Type::Function {
                ret,
                params,
                vararg,
            } => {
                let mut params = params.iter().map(|p| format!("{p:?}")).collect_vec();
                if *vararg {
                    params.push("...".to_string());
                }
                write!(f, "{ret:?} ({})", params.join(", "))
            }
            Type::Struct { fields, packed } => {
                let fields = fields.iter().map(|t| format!("{t:?}")).join(", ");
                if *packed {
                    write!(f, "<{{{fields}}}>")
                } else {
                    write!(f, "{{{fields}}}")
                }
            }
            Type::Named { name, .. } | Type::Opaque(name) => write!(f, "%{name}"),
        }
    }
}
