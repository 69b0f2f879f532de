use crate::builder::translate;
use crate::ir::{Module, ValueId};
use crate::raw::*;

pub const VOID: RawTypeRef = RawTypeRef(0);
pub const I1: RawTypeRef = RawTypeRef(1);
pub const I32: RawTypeRef = RawTypeRef(2);
pub const PTR: RawTypeRef = RawTypeRef(3);
pub const LABEL: RawTypeRef = RawTypeRef(4);
pub const FN: RawTypeRef = RawTypeRef(5);

/// Assembles raw tables for tests. Keys are handed out in insertion order
/// and double as indices into the table.
pub struct RawModuleBuilder {
    raw: RawModule,
}

impl RawModuleBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            raw: RawModule {
                identifier: "test".to_string(),
                little_endian: true,
                pointer_size: 8,
                ..RawModule::default()
            },
        };
        for ty in [
            RawType::Void,
            RawType::Integer(1),
            RawType::Integer(32),
            RawType::Pointer {
                pointee: Box::new(RawType::Ref(I32)),
                addr_space: 0,
            },
            RawType::Label,
            RawType::Function {
                ret: Box::new(RawType::Ref(VOID)),
                params: Vec::new(),
                vararg: false,
            },
        ] {
            builder.ty(ty);
        }
        builder
    }

    pub fn ty(&mut self, ty: RawType) -> RawTypeRef {
        let key = RawTypeRef(self.raw.types.len() as u64);
        self.raw.types.push(RawTypeRecord { key, ty });
        key
    }

    pub fn value(
        &mut self,
        tag: ValueTag,
        name: Option<&str>,
        ty: RawTypeRef,
        payload: RawPayload,
    ) -> RawRef {
        let key = RawRef(self.raw.values.len() as u64);
        self.raw.values.push(RawValue {
            key,
            tag,
            name: name.map(str::to_string),
            ty,
            location: None,
            payload,
        });
        key
    }

    fn payload_mut(&mut self, key: RawRef) -> &mut RawPayload {
        &mut self.raw.values[key.0 as usize].payload
    }

    pub fn int(&mut self, value: i64) -> RawRef {
        self.value(
            ValueTag::ConstantInt,
            None,
            I32,
            RawPayload::Constant(RawConstant {
                int_value: Some(value),
                ..RawConstant::default()
            }),
        )
    }

    pub fn global(&mut self, name: &str, initializer: Option<RawRef>) -> RawRef {
        let key = self.value(
            ValueTag::GlobalVariable,
            Some(name),
            PTR,
            RawPayload::Global(RawGlobal {
                initializer,
                ..RawGlobal::default()
            }),
        );
        self.raw.globals.push(key);
        key
    }

    pub fn function(&mut self, name: &str, params: &[&str]) -> (RawRef, Vec<RawRef>) {
        let arguments: Vec<_> = params
            .iter()
            .map(|param| {
                self.value(
                    ValueTag::Argument,
                    Some(*param),
                    PTR,
                    RawPayload::Argument(RawArgument::default()),
                )
            })
            .collect();
        let key = self.value(
            ValueTag::Function,
            Some(name),
            FN,
            RawPayload::Function(RawFunction {
                arguments: arguments.clone(),
                ..RawFunction::default()
            }),
        );
        self.raw.functions.push(key);
        (key, arguments)
    }

    pub fn block(&mut self, function: RawRef, name: &str) -> RawRef {
        let key = self.value(
            ValueTag::BasicBlock,
            Some(name),
            LABEL,
            RawPayload::Block(RawBlock::default()),
        );
        if let RawPayload::Function(payload) = self.payload_mut(function) {
            payload.blocks.push(key);
        }
        key
    }

    /// Appends an instruction to the end of `block`.
    pub fn inst_with(
        &mut self,
        block: RawRef,
        tag: ValueTag,
        name: Option<&str>,
        ty: RawTypeRef,
        fields: RawInstruction,
    ) -> RawRef {
        let key = self.value(tag, name, ty, RawPayload::Instruction(fields));
        if let RawPayload::Block(payload) = self.payload_mut(block) {
            payload.instructions.push(key);
        }
        key
    }

    pub fn inst(
        &mut self,
        block: RawRef,
        tag: ValueTag,
        name: Option<&str>,
        ty: RawTypeRef,
        operands: &[RawRef],
    ) -> RawRef {
        self.inst_with(
            block,
            tag,
            name,
            ty,
            RawInstruction {
                operands: operands.to_vec(),
                ..RawInstruction::default()
            },
        )
    }

    pub fn icmp(&mut self, block: RawRef, name: &str, lhs: RawRef, rhs: RawRef) -> RawRef {
        self.inst_with(
            block,
            ValueTag::ICmp,
            Some(name),
            I1,
            RawInstruction {
                operands: vec![lhs, rhs],
                predicate: Some(32),
                ..RawInstruction::default()
            },
        )
    }

    pub fn raw(&self) -> &RawModule {
        &self.raw
    }

    pub fn build(self) -> RawModule {
        self.raw
    }

    pub fn translate(self) -> Module {
        translate(&self.raw).unwrap()
    }
}

/// The value with the given name. Panics if there is none.
pub fn named(module: &Module, name: &str) -> ValueId {
    module
        .values()
        .iter()
        .find(|value| value.name.as_deref() == Some(name))
        .map(|value| value.id)
        .unwrap_or_else(|| panic!("No value named {name}."))
}

/// A function with a straight line body of `size` blocks, each holding an
/// addition and an unconditional branch to the next one.
pub fn straight_line(size: usize) -> Module {
    let mut builder = RawModuleBuilder::new();
    let (f, _) = builder.function("straight", &[]);
    let blocks: Vec<_> = (0..size)
        .map(|i| builder.block(f, &format!("b{i}")))
        .collect();
    let one = builder.int(1);
    for (i, &block) in blocks.iter().enumerate() {
        builder.inst(block, ValueTag::Add, Some(format!("x{i}").as_str()), I32, &[one, one]);
        match blocks.get(i + 1) {
            Some(&next) => builder.inst(block, ValueTag::Br, None, VOID, &[next]),
            None => builder.inst(block, ValueTag::Ret, None, VOID, &[]),
        };
    }
    builder.translate()
}

/// ```txt
///   entry:   %na = icmp eq %a, 0    br %na, then, check_b
///   check_b: %nb = icmp eq %b, 0    br %nb, then, store
///   then:    %bb = icmp eq %b, 1    br %bb, store, join
///   store:   store 1, @x            br join
///   join:    ret
/// ```
/// That is, `if (!a || !b) { if (b) store } else { store }` with both
/// stores being the same instruction.
pub fn short_circuit() -> Module {
    let mut builder = RawModuleBuilder::new();
    let x = builder.global("x", None);
    let (f, args) = builder.function("f", &["a", "b"]);
    let entry = builder.block(f, "entry");
    let check_b = builder.block(f, "check_b");
    let then = builder.block(f, "then");
    let store = builder.block(f, "store");
    let join = builder.block(f, "join");
    let zero = builder.int(0);
    let one = builder.int(1);

    let na = builder.icmp(entry, "na", args[0], zero);
    builder.inst(entry, ValueTag::Br, Some("br_a"), VOID, &[na, then, check_b]);
    let nb = builder.icmp(check_b, "nb", args[1], zero);
    builder.inst(check_b, ValueTag::Br, Some("br_b"), VOID, &[nb, then, store]);
    let bb = builder.icmp(then, "bb", args[1], one);
    builder.inst(then, ValueTag::Br, Some("br_inner"), VOID, &[bb, store, join]);
    builder.inst(store, ValueTag::Store, Some("st"), VOID, &[one, x]);
    builder.inst(store, ValueTag::Br, Some("br_join"), VOID, &[join]);
    builder.inst(join, ValueTag::Ret, Some("ret"), VOID, &[]);
    builder.translate()
}
