//! Bytecode types for the muesli compiler.
//!
//! This module contains the core bytecode types:
//!
//! - [`OpCode`] - The subset of the stack machine's instruction set we emit
//! - [`CodeBuffer`] - Instruction bytes of one method plus its line table
//! - [`PoolEntry`] and [`ConstantPool`] - Per-class constant storage

mod chunk;
mod constant;
mod opcode;

pub use chunk::{CodeBuffer, LineNumberEntry};
pub use constant::{ConstantPool, PoolEntry};
pub use opcode::OpCode;
