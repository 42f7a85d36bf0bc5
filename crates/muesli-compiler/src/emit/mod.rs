//! Bytecode emitter for the muesli compiler.
//!
//! The [`BytecodeEmitter`] owns the [`MethodSymbol`] being compiled and is
//! the only place instructions are written. Every emission helper updates
//! the method's operand-stack accounting, so the recorded maximum always
//! matches the instruction stream.
//!
//! # Example
//!
//! ```ignore
//! let mut pool = ConstantPool::new();
//! let mut emitter = BytecodeEmitter::new(&mut pool, method, true);
//!
//! let start = emitter.new_label();
//! emitter.mark(start);
//! emitter.set_line(3);
//! emitter.emit_literal(&LiteralValue::Int(42))?;
//! emitter.emit_return(&Descriptor::INT)?;
//!
//! let (method, artifact) = emitter.finish()?;
//! ```

use tracing::debug;

use muesli_core::{
    CompilationError, Descriptor, Label, LiteralValue, MethodSymbol, PrimitiveKind, Result,
};

use crate::artifact::{LocalVariableEntry, MethodArtifact};
use crate::bytecode::{CodeBuffer, ConstantPool, OpCode};
use crate::types::{self, PushInstruction};

/// Call instruction flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

impl InvokeKind {
    fn opcode(self) -> OpCode {
        match self {
            InvokeKind::Virtual => OpCode::Invokevirtual,
            InvokeKind::Special => OpCode::Invokespecial,
            InvokeKind::Static => OpCode::Invokestatic,
            InvokeKind::Interface => OpCode::Invokeinterface,
        }
    }
}

struct PendingLocal {
    name: String,
    descriptor: String,
    start: Label,
    end: Label,
    slot: u16,
}

/// Emits the body of one method.
pub struct BytecodeEmitter<'pool> {
    code: CodeBuffer,
    pool: &'pool mut ConstantPool,
    method: MethodSymbol,
    labels: Vec<Option<u16>>,
    locals: Vec<PendingLocal>,
    current_line: u32,
    debug_info: bool,
}

impl<'pool> BytecodeEmitter<'pool> {
    /// Create an emitter for `method`, writing constants into `pool`.
    pub fn new(pool: &'pool mut ConstantPool, method: MethodSymbol, debug_info: bool) -> Self {
        Self {
            code: CodeBuffer::new(),
            pool,
            method,
            labels: Vec::new(),
            locals: Vec::new(),
            current_line: 0,
            debug_info,
        }
    }

    pub fn method(&self) -> &MethodSymbol {
        &self.method
    }

    pub fn method_mut(&mut self) -> &mut MethodSymbol {
        &mut self.method
    }

    pub fn pool_mut(&mut self) -> &mut ConstantPool {
        self.pool
    }

    /// Set current source line for debug info.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    pub fn code(&self) -> &CodeBuffer {
        &self.code
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    /// Allocate an unbound label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() as u32 - 1)
    }

    /// Bind `label` to the current offset.
    pub fn mark(&mut self, label: Label) {
        let offset = self.code.offset();
        if let Some(slot) = self.labels.get_mut(label.0 as usize) {
            *slot = Some(offset);
        }
    }

    fn label_offset(&self, label: Label) -> Result<u16> {
        self.labels
            .get(label.0 as usize)
            .copied()
            .flatten()
            .ok_or_else(|| CompilationError::internal(format!("unbound label {}", label.0)))
    }

    /// Record a local-variable debug entry valid between two labels.
    pub fn declare_local(
        &mut self,
        name: &str,
        descriptor: &Descriptor,
        start: Label,
        end: Label,
        slot: u16,
    ) {
        self.locals.push(PendingLocal {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            start,
            end,
            slot,
        });
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    fn line(&self) -> u32 {
        if self.debug_info { self.current_line } else { 0 }
    }

    fn op(&mut self, op: OpCode) {
        let line = self.line();
        self.code.write_op(op, line);
    }

    fn op_u16(&mut self, op: OpCode, value: u16) {
        self.op(op);
        self.code.write_u16(value);
    }

    fn push(&mut self) {
        self.method.increase_stack(1);
    }

    fn pop(&mut self, count: u16) -> Result<()> {
        self.method.decrease_stack(count)
    }

    /// Emit a load or store of `slot` using the short, narrow or wide form.
    fn slot_op(&mut self, (general, short): (OpCode, OpCode), slot: u16) {
        if let Some(op) = u8::try_from(slot).ok().and_then(|s| short.short_form(s)) {
            self.op(op);
        } else if let Ok(narrow) = u8::try_from(slot) {
            self.op(general);
            self.code.write_byte(narrow);
        } else {
            self.op(OpCode::Wide);
            self.op_u16(general, slot);
        }
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Push a literal constant.
    pub fn emit_literal(&mut self, value: &LiteralValue) -> Result<()> {
        match types::push_instruction(value) {
            PushInstruction::Simple(op) => self.op(op),
            PushInstruction::Bipush(v) => {
                self.op(OpCode::Bipush);
                self.code.write_byte(v as u8);
            }
            PushInstruction::Sipush(v) => self.op_u16(OpCode::Sipush, v as u16),
            PushInstruction::Ldc | PushInstruction::Ldc2 => {
                let index = self.pool.literal(value)?.ok_or_else(|| {
                    CompilationError::internal("null literal has no pool entry")
                })?;
                match (value, u8::try_from(index)) {
                    (LiteralValue::Long(_) | LiteralValue::Double(_), _) => {
                        self.op_u16(OpCode::Ldc2W, index)
                    }
                    (_, Ok(narrow)) => {
                        self.op(OpCode::Ldc);
                        self.code.write_byte(narrow);
                    }
                    (_, Err(_)) => self.op_u16(OpCode::LdcW, index),
                }
            }
        }
        self.push();
        Ok(())
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    pub fn emit_load(&mut self, desc: &Descriptor, slot: u16) {
        self.slot_op(types::load_ops(desc), slot);
        self.push();
    }

    pub fn emit_store(&mut self, desc: &Descriptor, slot: u16) -> Result<()> {
        self.slot_op(types::store_ops(desc), slot);
        self.pop(1)
    }

    /// Push the instance reference (`aload_0`).
    pub fn emit_load_this(&mut self) -> Result<()> {
        if self.method.is_static() {
            return Err(CompilationError::internal(format!(
                "instance reference used in static method '{}'",
                self.method.name
            )));
        }
        self.op(OpCode::Aload0);
        self.push();
        Ok(())
    }

    // ==========================================================================
    // Stack and Conversions
    // ==========================================================================

    /// Discard the value of type `desc` on top of the stack.
    pub fn emit_pop(&mut self, desc: &Descriptor) -> Result<()> {
        self.op(if types::is_two_word(desc) {
            OpCode::Pop2
        } else {
            OpCode::Pop
        });
        self.pop(1)
    }

    /// Widen the value on top of the stack from `from` to `to`, if needed.
    pub fn emit_widen(&mut self, from: PrimitiveKind, to: PrimitiveKind) {
        if let Some(op) = types::widening_op(from, to) {
            self.op(op);
        }
    }

    /// Return from the method; non-void returns consume the top value.
    pub fn emit_return(&mut self, desc: &Descriptor) -> Result<()> {
        self.op(types::return_op(desc));
        if !desc.is_void() {
            self.pop(1)?;
        }
        Ok(())
    }

    // ==========================================================================
    // Fields and Calls
    // ==========================================================================

    /// Read a field. Instance reads consume the receiver.
    pub fn emit_get_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &Descriptor,
        is_static: bool,
    ) -> Result<()> {
        let index = self.pool.field_ref(owner, name, &desc.to_string())?;
        if is_static {
            self.op_u16(OpCode::Getstatic, index);
        } else {
            self.op_u16(OpCode::Getfield, index);
            self.pop(1)?;
        }
        self.push();
        Ok(())
    }

    /// Write a field. Consumes the value, and the receiver for instance
    /// fields.
    pub fn emit_put_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &Descriptor,
        is_static: bool,
    ) -> Result<()> {
        let index = self.pool.field_ref(owner, name, &desc.to_string())?;
        if is_static {
            self.op_u16(OpCode::Putstatic, index);
            self.pop(1)
        } else {
            self.op_u16(OpCode::Putfield, index);
            self.pop(2)
        }
    }

    /// Call a method with `arg_count` arguments already on the stack (after
    /// the receiver, for non-static calls).
    pub fn emit_invoke(
        &mut self,
        kind: InvokeKind,
        owner: &str,
        name: &str,
        descriptor: &str,
        arg_count: u16,
        return_type: &Descriptor,
    ) -> Result<()> {
        let index = match kind {
            InvokeKind::Interface => self.pool.interface_method_ref(owner, name, descriptor)?,
            _ => self.pool.method_ref(owner, name, descriptor)?,
        };
        self.op_u16(kind.opcode(), index);
        let consumed = if kind == InvokeKind::Static {
            arg_count
        } else {
            arg_count + 1
        };
        if kind == InvokeKind::Interface {
            self.code.write_byte(u8::try_from(consumed).unwrap_or(u8::MAX));
            self.code.write_byte(0);
        }
        self.pop(consumed)?;
        if !return_type.is_void() {
            self.push();
        }
        Ok(())
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Finish the method: resolve debug entries and commit stack and slot
    /// requirements.
    pub fn finish(self) -> Result<(MethodSymbol, MethodArtifact)> {
        let mut local_variables = Vec::new();
        if self.debug_info {
            for local in &self.locals {
                let start_pc = self.label_offset(local.start)?;
                let end_pc = self.label_offset(local.end)?;
                local_variables.push(LocalVariableEntry {
                    name: local.name.clone(),
                    descriptor: local.descriptor.clone(),
                    start_pc,
                    length: end_pc.saturating_sub(start_pc),
                    slot: local.slot,
                });
            }
        }

        let method = self.method;
        debug!(
            method = %method.name,
            descriptor = %method.descriptor(),
            max_stack = method.stack_size(),
            max_locals = method.local_variables(),
            "finalized method"
        );
        let artifact = MethodArtifact {
            name: method.name.clone(),
            descriptor: method.descriptor(),
            modifiers: method.modifiers,
            max_stack: method.stack_size(),
            max_locals: method.local_variables(),
            code: Some(self.code),
            local_variables,
        };
        Ok((method, artifact))
    }
}
