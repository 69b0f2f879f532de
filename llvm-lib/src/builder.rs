use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, trace_span};

use crate::error::TranslationError;
use crate::ir::*;
use crate::raw::*;

type Result<T> = std::result::Result<T, TranslationError>;

/// Reads a raw table and translates it. The reader is consumed before any
/// translation starts, whether or not it succeeded.
pub fn read_module(reader: impl RawReader) -> Result<Module> {
    let raw = reader.read()?;
    translate(&raw)
}

/// Translates a raw table into a fully linked module.
///
/// Every value referred to by key gets exactly one arena slot, so operands
/// that share a key share the same [`ValueId`]. The translation happens in
/// two passes:
/// 1. Every global, alias, function, argument, block and instruction gets a
///    slot up front, in module order. After this, every reference to a
///    non-constant value can be resolved, forward or backward.
/// 2. The content of each slot is filled in. Constants are translated the
///    first time they are referenced and cached from then on.
pub fn translate(raw: &RawModule) -> Result<Module> {
    if let Some(message) = &raw.error {
        return Err(TranslationError::Reader(message.clone()));
    }
    let mut builder = Builder::new(raw)?;
    builder.translate_types()?;
    {
        let _span = trace_span!("register").entered();
        builder.register_module()?;
    }
    {
        let _span = trace_span!("fill").entered();
        builder.fill_module()?;
    }
    let module = builder.freeze()?;
    debug!(
        identifier = %module.identifier,
        values = module.values.len(),
        types = module.types.len(),
        functions = module.functions.len(),
        "Translated module"
    );
    Ok(module)
}

/// A value whose content is not known yet.
struct Slot {
    name: Option<String>,
    ty: TypeId,
    location: Option<SourceLocation>,
    content: Option<ValueContent>,
}

struct Builder<'raw> {
    raw: &'raw RawModule,
    records: FxHashMap<RawRef, &'raw RawValue>,
    slots: Vec<Slot>,
    cache: FxHashMap<RawRef, ValueId>,
    /// Constants whose operands are being translated right now.
    in_progress: FxHashSet<RawRef>,
    types: Vec<Option<Type>>,
    type_cache: FxHashMap<RawTypeRef, TypeId>,
    owners: FxHashMap<ValueId, ValueId>,
}

impl<'raw> Builder<'raw> {
    fn new(raw: &'raw RawModule) -> Result<Self> {
        let mut records = FxHashMap::default();
        for record in &raw.values {
            if records.insert(record.key, record).is_some() {
                return Err(TranslationError::DuplicateKey(record.key));
            }
        }
        Ok(Self {
            raw,
            records,
            slots: Vec::with_capacity(raw.values.len()),
            cache: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            types: Vec::with_capacity(raw.types.len()),
            type_cache: FxHashMap::default(),
            owners: FxHashMap::default(),
        })
    }

    fn record(&self, key: RawRef) -> Result<&'raw RawValue> {
        self.records
            .get(&key)
            .copied()
            .ok_or(TranslationError::UnknownValue(key))
    }

    // Types //

    fn translate_types(&mut self) -> Result<()> {
        let raw = self.raw;
        for record in &raw.types {
            let id = TypeId(self.types.len());
            self.types.push(None);
            if self.type_cache.insert(record.key, id).is_some() {
                return Err(TranslationError::DuplicateType(record.key));
            }
        }
        for record in &raw.types {
            let id = self.type_cache[&record.key];
            if matches!(record.ty, RawType::Ref(_) | RawType::Upref(_)) {
                return Err(TranslationError::MalformedType { key: record.key });
            }
            let mut enclosing = vec![id];
            let ty = self.translate_type(&record.ty, &mut enclosing)?;
            self.types[id.0] = Some(ty);
        }
        Ok(())
    }

    /// Translates the outermost layer of `raw`, which must not be a reference.
    /// The id of the type being built is on top of `enclosing`.
    fn translate_type(&mut self, raw: &RawType, enclosing: &mut Vec<TypeId>) -> Result<Type> {
        Ok(match raw {
            RawType::Void => Type::Void,
            RawType::Label => Type::Label,
            RawType::Metadata => Type::Metadata,
            RawType::Integer(width) => Type::Integer(*width),
            RawType::Float(kind) => Type::Float(*kind),
            RawType::Opaque(name) => Type::Opaque(name.clone()),
            RawType::Pointer {
                pointee,
                addr_space,
            } => Type::Pointer {
                pointee: self.type_operand(pointee, enclosing)?,
                addr_space: *addr_space,
            },
            RawType::Array { len, elem } => Type::Array {
                len: *len,
                elem: self.type_operand(elem, enclosing)?,
            },
            RawType::Vector { len, elem } => Type::Vector {
                len: *len,
                elem: self.type_operand(elem, enclosing)?,
            },
            RawType::Function {
                ret,
                params,
                vararg,
            } => Type::Function {
                ret: self.type_operand(ret, enclosing)?,
                params: params
                    .iter()
                    .map(|param| self.type_operand(param, enclosing))
                    .collect::<Result<_>>()?,
                vararg: *vararg,
            },
            RawType::Struct { fields, packed } => Type::Struct {
                fields: fields
                    .iter()
                    .map(|field| self.type_operand(field, enclosing))
                    .collect::<Result<_>>()?,
                packed: *packed,
            },
            RawType::Named { name, inner } => Type::Named {
                name: name.clone(),
                inner: self.type_operand(inner, enclosing)?,
            },
            RawType::Ref(_) | RawType::Upref(_) => {
                unreachable!("references are resolved by type_operand")
            }
        })
    }

    fn type_operand(&mut self, raw: &RawType, enclosing: &mut Vec<TypeId>) -> Result<TypeId> {
        match raw {
            RawType::Ref(key) => self
                .type_cache
                .get(key)
                .copied()
                .ok_or(TranslationError::UnknownType(*key)),
            RawType::Upref(level) => enclosing
                .len()
                .checked_sub(*level as usize + 1)
                .map(|index| enclosing[index])
                .ok_or(TranslationError::UnresolvedUpref { level: *level }),
            _ => {
                let id = TypeId(self.types.len());
                self.types.push(None);
                enclosing.push(id);
                let ty = self.translate_type(raw, enclosing);
                enclosing.pop();
                self.types[id.0] = Some(ty?);
                Ok(id)
            }
        }
    }

    fn value_type(&self, key: RawTypeRef) -> Result<TypeId> {
        self.type_cache
            .get(&key)
            .copied()
            .ok_or(TranslationError::UnknownType(key))
    }

    // Pass 1 //

    fn allocate(&mut self, record: &RawValue, content: Option<ValueContent>) -> Result<ValueId> {
        let id = ValueId(self.slots.len());
        let ty = self.value_type(record.ty)?;
        self.slots.push(Slot {
            name: record.name.clone(),
            ty,
            location: record.location.as_ref().map(|loc| SourceLocation {
                file: loc.file.clone(),
                line: loc.line,
                column: loc.column,
            }),
            content,
        });
        Ok(id)
    }

    /// Reserves a slot for a record reached through the module structure.
    fn register(&mut self, key: RawRef, expected: fn(ValueTag) -> bool) -> Result<ValueId> {
        let record = self.record(key)?;
        if !expected(record.tag) {
            return Err(TranslationError::UnexpectedPayload {
                key,
                tag: record.tag,
            });
        }
        if self.cache.contains_key(&key) {
            return Err(TranslationError::DuplicateKey(key));
        }
        let id = self.allocate(record, None)?;
        self.cache.insert(key, id);
        trace!(%key, ?id, tag = ?record.tag, "Registered");
        Ok(id)
    }

    fn register_module(&mut self) -> Result<()> {
        let raw = self.raw;
        for &key in &raw.globals {
            self.register(key, |tag| tag == ValueTag::GlobalVariable)?;
        }
        for &key in &raw.aliases {
            self.register(key, |tag| tag == ValueTag::Alias)?;
        }
        for &key in &raw.functions {
            self.register(key, |tag| tag == ValueTag::Function)?;
        }
        for &key in &raw.functions {
            let function = self.cache[&key];
            let payload = function_payload(self.record(key)?)?;
            for &arg in &payload.arguments {
                let id = self.register(arg, |tag| tag == ValueTag::Argument)?;
                self.owners.insert(id, function);
            }
            for &block_key in &payload.blocks {
                let block = self.register(block_key, |tag| tag == ValueTag::BasicBlock)?;
                self.owners.insert(block, function);
                for &inst in &block_payload(self.record(block_key)?)?.instructions {
                    let id = self.register(inst, ValueTag::is_instruction)?;
                    self.owners.insert(id, block);
                }
            }
        }
        Ok(())
    }

    // Pass 2 //

    /// Resolves an operand reference. Registered values come from the cache,
    /// constants are translated on first use.
    fn operand(&mut self, key: RawRef) -> Result<ValueId> {
        if let Some(&id) = self.cache.get(&key) {
            trace!(%key, ?id, "Resolved from cache");
            return Ok(id);
        }
        let record = self.record(key)?;
        if record.tag.is_global() {
            return Err(TranslationError::DirectGlobalReference {
                key,
                tag: record.tag,
            });
        }
        if !record.tag.is_constant() {
            return Err(TranslationError::KnotTyingFailure { key });
        }
        self.translate_constant(record)
    }

    fn operands(&mut self, keys: &[RawRef]) -> Result<Vec<ValueId>> {
        keys.iter().map(|&key| self.operand(key)).collect()
    }

    fn translate_constant(&mut self, record: &'raw RawValue) -> Result<ValueId> {
        if !self.in_progress.insert(record.key) {
            return Err(TranslationError::ConstantCycle(record.key));
        }
        let content = self.constant_content(record);
        self.in_progress.remove(&record.key);
        let id = self.allocate(record, Some(content?))?;
        self.cache.insert(record.key, id);
        trace!(key = %record.key, ?id, "Translated constant");
        Ok(id)
    }

    fn constant_content(&mut self, record: &'raw RawValue) -> Result<ValueContent> {
        let unexpected = || TranslationError::UnexpectedPayload {
            key: record.key,
            tag: record.tag,
        };
        if record.tag == ValueTag::InlineAsm {
            let RawPayload::InlineAsm(asm) = &record.payload else {
                return Err(unexpected());
            };
            return Ok(ValueContent::InlineAsm {
                asm: asm.asm.clone(),
                constraints: asm.constraints.clone(),
                side_effects: asm.side_effects,
            });
        }
        let empty = RawConstant::default();
        let payload = match &record.payload {
            RawPayload::Constant(constant) => constant,
            RawPayload::None => &empty,
            _ => return Err(unexpected()),
        };
        let constant = match record.tag {
            ValueTag::ConstantAggregateZero => Constant::AggregateZero,
            ValueTag::ConstantPointerNull => Constant::PointerNull,
            ValueTag::UndefValue => Constant::Undef,
            ValueTag::ConstantInt => Constant::Int(payload.int_value.ok_or_else(unexpected)?),
            ValueTag::ConstantFP => Constant::Float(payload.float_value.ok_or_else(unexpected)?),
            ValueTag::ConstantString => {
                Constant::String(payload.string_value.clone().ok_or_else(unexpected)?)
            }
            ValueTag::ConstantArray => Constant::Array(self.operands(&payload.operands)?),
            ValueTag::ConstantStruct => Constant::Struct(self.operands(&payload.operands)?),
            ValueTag::ConstantVector => Constant::Vector(self.operands(&payload.operands)?),
            ValueTag::BlockAddress => match self.operands(&payload.operands)?.as_slice() {
                [function, block] => Constant::BlockAddress {
                    function: *function,
                    block: *block,
                },
                other => {
                    return Err(TranslationError::InvalidArity {
                        opcode: record.tag,
                        count: other.len(),
                    });
                }
            },
            ValueTag::ConstantExpr => {
                let expr = payload.expr.as_ref().ok_or_else(unexpected)?;
                Constant::Expr(Box::new(self.instruction(expr.opcode, &expr.instruction)?))
            }
            _ => return Err(unexpected()),
        };
        Ok(ValueContent::Constant(constant))
    }

    fn fill(&mut self, id: ValueId, content: ValueContent) {
        self.slots[id.0].content = Some(content);
    }

    fn fill_module(&mut self) -> Result<()> {
        let raw = self.raw;
        for &key in &raw.globals {
            let record = self.record(key)?;
            let RawPayload::Global(global) = &record.payload else {
                return Err(unexpected_payload(record));
            };
            let initializer = global.initializer.map(|init| self.operand(init)).transpose()?;
            let content = ValueContent::GlobalVariable(GlobalVariable {
                external: global.external,
                align: global.align,
                linkage: global.linkage,
                visibility: global.visibility,
                section: global.section.clone(),
                thread_local: global.thread_local,
                constant: global.constant,
                initializer,
            });
            self.fill(self.cache[&key], content);
        }
        for &key in &raw.aliases {
            let record = self.record(key)?;
            let RawPayload::Alias(alias) = &record.payload else {
                return Err(unexpected_payload(record));
            };
            let content = ValueContent::Alias(GlobalAlias {
                linkage: alias.linkage,
                visibility: alias.visibility,
                aliasee: self.operand(alias.aliasee)?,
            });
            self.fill(self.cache[&key], content);
        }
        for &key in &raw.functions {
            self.fill_function(key)?;
        }
        Ok(())
    }

    fn fill_function(&mut self, key: RawRef) -> Result<()> {
        let payload = function_payload(self.record(key)?)?;
        for &arg in &payload.arguments {
            let attributes = match &self.record(arg)?.payload {
                RawPayload::Argument(attrs) => ParamAttributes {
                    sret: attrs.sret,
                    byval: attrs.byval,
                    nest: attrs.nest,
                    no_alias: attrs.noalias,
                    no_capture: attrs.nocapture,
                },
                RawPayload::None => ParamAttributes::default(),
                _ => return Err(unexpected_payload(self.record(arg)?)),
            };
            self.fill(self.cache[&arg], ValueContent::Argument(attributes));
        }
        let blocks: FxHashSet<ValueId> =
            payload.blocks.iter().map(|key| self.cache[key]).collect();
        let no_fields = RawInstruction::default();
        for &block_key in &payload.blocks {
            let raw_block = block_payload(self.record(block_key)?)?;
            for &inst_key in &raw_block.instructions {
                let record = self.record(inst_key)?;
                let fields = match &record.payload {
                    RawPayload::Instruction(fields) => fields,
                    RawPayload::None => &no_fields,
                    _ => return Err(unexpected_payload(record)),
                };
                let inst = self.instruction(record.tag, fields)?;
                check_targets(record.tag, &inst, &blocks)?;
                self.fill(self.cache[&inst_key], ValueContent::Instruction(inst));
            }
            let block = BasicBlock {
                instructions: raw_block
                    .instructions
                    .iter()
                    .map(|key| self.cache[key])
                    .collect(),
            };
            self.fill(self.cache[&block_key], ValueContent::BasicBlock(block));
        }
        let function = Function {
            external: payload.external,
            align: payload.align,
            linkage: payload.linkage,
            visibility: payload.visibility,
            section: payload.section.clone(),
            calling_convention: payload.calling_convention,
            gc: payload.gc.clone(),
            arguments: payload.arguments.iter().map(|key| self.cache[key]).collect(),
            blocks: payload.blocks.iter().map(|key| self.cache[key]).collect(),
            vararg: payload.vararg,
        };
        self.fill(self.cache[&key], ValueContent::Function(function));
        Ok(())
    }

    /// Decodes one instruction or constant expression, validating the shape
    /// of its operand list.
    fn instruction(&mut self, tag: ValueTag, fields: &RawInstruction) -> Result<Instruction> {
        use ValueTag as T;
        let ops = self.operands(&fields.operands)?;
        let count = ops.len();
        let arity = || TranslationError::InvalidArity { opcode: tag, count };
        let call_site = |callee: ValueId, arguments: &[ValueId]| CallSite {
            callee,
            arguments: arguments.to_vec(),
            calling_convention: fields.calling_convention,
            tail_call: fields.tail_call,
            struct_return: fields.struct_return,
        };

        let inst = match (tag, ops.as_slice()) {
            (T::Ret, []) => Instruction::Ret(None),
            (T::Ret, [value]) => Instruction::Ret(Some(*value)),
            (T::Ret, _) => return Err(TranslationError::TooManyReturnValues { count }),

            (T::Br, [target]) => Instruction::Br(*target),
            (T::Br, [condition, then_block, else_block]) => Instruction::CondBr {
                condition: *condition,
                then_block: *then_block,
                else_block: *else_block,
            },
            (T::Br, _) => return Err(TranslationError::MalformedBranch { count }),

            (T::Switch, [value, default, cases @ ..]) if cases.len() % 2 == 0 => {
                Instruction::Switch {
                    value: *value,
                    default: *default,
                    cases: cases.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
                }
            }
            (T::Switch, _) => return Err(TranslationError::MalformedSwitch { count }),

            (T::IndirectBr, [address, targets @ ..]) => Instruction::IndirectBr {
                address: *address,
                targets: targets.to_vec(),
            },
            (T::IndirectBr, _) => return Err(TranslationError::MalformedIndirectBranch { count }),

            (T::Invoke, [callee, arguments @ .., normal, unwind]) => Instruction::Invoke {
                call: call_site(*callee, arguments),
                normal: *normal,
                unwind: *unwind,
            },
            (T::Call, [callee, arguments @ ..]) => Instruction::Call(call_site(*callee, arguments)),

            (T::Unwind, []) => Instruction::Unwind,
            (T::Unreachable, []) => Instruction::Unreachable,

            (T::ICmp, [lhs, rhs]) => Instruction::ICmp {
                predicate: fields
                    .predicate
                    .and_then(IntPredicate::from_code)
                    .ok_or(invalid_predicate("integer", fields.predicate))?,
                lhs: *lhs,
                rhs: *rhs,
            },
            (T::FCmp, [lhs, rhs]) => Instruction::FCmp {
                predicate: fields
                    .predicate
                    .and_then(FloatPredicate::from_code)
                    .ok_or(invalid_predicate("floating point", fields.predicate))?,
                lhs: *lhs,
                rhs: *rhs,
            },

            (T::Alloca, []) => Instruction::Alloca {
                count: None,
                align: fields.align,
            },
            (T::Alloca, [count]) => Instruction::Alloca {
                count: Some(*count),
                align: fields.align,
            },
            (T::Load, [address]) => Instruction::Load {
                address: *address,
                volatile: fields.volatile,
                align: fields.align,
            },
            (T::Store, [value, address]) => Instruction::Store {
                value: *value,
                address: *address,
                volatile: fields.volatile,
                align: fields.align,
                addr_space: fields.addr_space,
            },
            (T::GetElementPtr, [base, indices @ ..]) => Instruction::GetElementPtr {
                in_bounds: fields.in_bounds,
                base: *base,
                indices: indices.to_vec(),
            },

            (T::Select, [condition, on_true, on_false]) => Instruction::Select {
                condition: *condition,
                on_true: *on_true,
                on_false: *on_false,
            },
            (T::VaArg, [list]) => Instruction::VaArg { list: *list },
            (T::ExtractElement, [vector, index]) => Instruction::ExtractElement {
                vector: *vector,
                index: *index,
            },
            (T::InsertElement, [vector, element, index]) => Instruction::InsertElement {
                vector: *vector,
                element: *element,
                index: *index,
            },
            (T::ShuffleVector, [lhs, rhs, mask]) => Instruction::ShuffleVector {
                lhs: *lhs,
                rhs: *rhs,
                mask: *mask,
            },
            (T::ExtractValue, [aggregate]) => Instruction::ExtractValue {
                aggregate: *aggregate,
                indices: fields.indices.clone(),
            },
            (T::InsertValue, [aggregate, element]) => Instruction::InsertValue {
                aggregate: *aggregate,
                element: *element,
                indices: fields.indices.clone(),
            },
            (T::Phi, incoming) if !incoming.is_empty() && incoming.len() % 2 == 0 => {
                Instruction::Phi(incoming.chunks_exact(2).map(|c| (c[0], c[1])).collect())
            }

            (tag, [value]) if cast_op(tag).is_some() => Instruction::Cast {
                op: cast_op(tag).ok_or_else(arity)?,
                value: *value,
            },
            (tag, [lhs, rhs]) if binary_op(tag).is_some() => Instruction::Binary {
                op: binary_op(tag).ok_or_else(arity)?,
                lhs: *lhs,
                rhs: *rhs,
            },

            _ => return Err(arity()),
        };
        Ok(inst)
    }

    fn freeze(self) -> Result<Module> {
        let values = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                let id = ValueId(index);
                Ok(Value {
                    id,
                    name: slot.name,
                    ty: slot.ty,
                    location: slot.location,
                    content: slot.content.ok_or(TranslationError::Untranslated(id))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let types = self
            .types
            .into_iter()
            .enumerate()
            .map(|(index, ty)| ty.ok_or(TranslationError::UntranslatedType(TypeId(index))))
            .collect::<Result<Vec<_>>>()?;
        let ids = |keys: &[RawRef]| keys.iter().map(|key| self.cache[key]).collect::<Vec<_>>();
        Ok(Module {
            identifier: self.raw.identifier.clone(),
            data_layout: self.raw.data_layout.clone(),
            target_triple: self.raw.target_triple.clone(),
            inline_asm: self.raw.inline_asm.clone(),
            little_endian: self.raw.little_endian,
            pointer_size: self.raw.pointer_size,
            globals: ids(&self.raw.globals),
            aliases: ids(&self.raw.aliases),
            functions: ids(&self.raw.functions),
            values,
            types,
            owners: self.owners,
        })
    }
}

fn unexpected_payload(record: &RawValue) -> TranslationError {
    TranslationError::UnexpectedPayload {
        key: record.key,
        tag: record.tag,
    }
}

fn invalid_predicate(kind: &'static str, code: Option<u32>) -> TranslationError {
    TranslationError::InvalidPredicate {
        kind,
        code: code.unwrap_or(u32::MAX),
    }
}

fn function_payload(record: &RawValue) -> Result<&RawFunction> {
    match &record.payload {
        RawPayload::Function(function) => Ok(function),
        _ => Err(unexpected_payload(record)),
    }
}

/// Control may only be transferred to blocks of the enclosing function.
fn check_targets(tag: ValueTag, inst: &Instruction, blocks: &FxHashSet<ValueId>) -> Result<()> {
    if inst.successor_blocks().iter().all(|target| blocks.contains(target)) {
        return Ok(());
    }
    let count = inst.operands().len();
    Err(match inst {
        Instruction::Switch { .. } => TranslationError::MalformedSwitch { count },
        Instruction::IndirectBr { .. } => TranslationError::MalformedIndirectBranch { count },
        Instruction::Br(_) | Instruction::CondBr { .. } => {
            TranslationError::MalformedBranch { count }
        }
        _ => TranslationError::InvalidArity { opcode: tag, count },
    })
}

fn block_payload(record: &RawValue) -> Result<&RawBlock> {
    match &record.payload {
        RawPayload::Block(block) => Ok(block),
        _ => Err(unexpected_payload(record)),
    }
}

fn binary_op(tag: ValueTag) -> Option<BinaryOp> {
    use ValueTag as T;
    Some(match tag {
        T::Add => BinaryOp::Add,
        T::FAdd => BinaryOp::FAdd,
        T::Sub => BinaryOp::Sub,
        T::FSub => BinaryOp::FSub,
        T::Mul => BinaryOp::Mul,
        T::FMul => BinaryOp::FMul,
        T::UDiv => BinaryOp::UDiv,
        T::SDiv => BinaryOp::SDiv,
        T::FDiv => BinaryOp::FDiv,
        T::URem => BinaryOp::URem,
        T::SRem => BinaryOp::SRem,
        T::FRem => BinaryOp::FRem,
        T::Shl => BinaryOp::Shl,
        T::LShr => BinaryOp::LShr,
        T::AShr => BinaryOp::AShr,
        T::And => BinaryOp::And,
        T::Or => BinaryOp::Or,
        T::Xor => BinaryOp::Xor,
        _ => return None,
    })
}

fn cast_op(tag: ValueTag) -> Option<CastOp> {
    use ValueTag as T;
    Some(match tag {
        T::Trunc => CastOp::Trunc,
        T::ZExt => CastOp::ZExt,
        T::SExt => CastOp::SExt,
        T::FPToUI => CastOp::FPToUI,
        T::FPToSI => CastOp::FPToSI,
        T::UIToFP => CastOp::UIToFP,
        T::SIToFP => CastOp::SIToFP,
        T::FPTrunc => CastOp::FPTrunc,
        T::FPExt => CastOp::FPExt,
        T::PtrToInt => CastOp::PtrToInt,
        T::IntToPtr => CastOp::IntToPtr,
        T::BitCast => CastOp::BitCast,
        _ => return None,
    })
}
