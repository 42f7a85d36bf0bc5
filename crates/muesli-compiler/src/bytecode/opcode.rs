//! Bytecode operation codes.
//!
//! Values match the target machine's instruction encoding. Only the
//! instructions the compiler emits are listed.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The target is a stack machine: loads and constant pushes place values on
/// the operand stack, stores and returns consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    AconstNull = 0x01,
    IconstM1 = 0x02,
    Iconst0 = 0x03,
    Iconst1 = 0x04,
    Iconst2 = 0x05,
    Iconst3 = 0x06,
    Iconst4 = 0x07,
    Iconst5 = 0x08,
    Lconst0 = 0x09,
    Lconst1 = 0x0a,
    Fconst0 = 0x0b,
    Fconst1 = 0x0c,
    Fconst2 = 0x0d,
    Dconst0 = 0x0e,
    Dconst1 = 0x0f,
    /// Operand: i8 value
    Bipush = 0x10,
    /// Operand: i16 value
    Sipush = 0x11,
    /// Operand: u8 pool index
    Ldc = 0x12,
    /// Operand: u16 pool index
    LdcW = 0x13,
    /// Operand: u16 pool index of a long or double
    Ldc2W = 0x14,

    // =========================================================================
    // Local Variables
    // =========================================================================
    /// Operand: u8 slot
    Iload = 0x15,
    Lload = 0x16,
    Fload = 0x17,
    Dload = 0x18,
    Aload = 0x19,
    Iload0 = 0x1a,
    Iload1 = 0x1b,
    Iload2 = 0x1c,
    Iload3 = 0x1d,
    Lload0 = 0x1e,
    Lload1 = 0x1f,
    Lload2 = 0x20,
    Lload3 = 0x21,
    Fload0 = 0x22,
    Fload1 = 0x23,
    Fload2 = 0x24,
    Fload3 = 0x25,
    Dload0 = 0x26,
    Dload1 = 0x27,
    Dload2 = 0x28,
    Dload3 = 0x29,
    Aload0 = 0x2a,
    Aload1 = 0x2b,
    Aload2 = 0x2c,
    Aload3 = 0x2d,
    /// Operand: u8 slot
    Istore = 0x36,
    Lstore = 0x37,
    Fstore = 0x38,
    Dstore = 0x39,
    Astore = 0x3a,
    Istore0 = 0x3b,
    Istore1 = 0x3c,
    Istore2 = 0x3d,
    Istore3 = 0x3e,
    Lstore0 = 0x3f,
    Lstore1 = 0x40,
    Lstore2 = 0x41,
    Lstore3 = 0x42,
    Fstore0 = 0x43,
    Fstore1 = 0x44,
    Fstore2 = 0x45,
    Fstore3 = 0x46,
    Dstore0 = 0x47,
    Dstore1 = 0x48,
    Dstore2 = 0x49,
    Dstore3 = 0x4a,
    Astore0 = 0x4b,
    Astore1 = 0x4c,
    Astore2 = 0x4d,
    Astore3 = 0x4e,

    // =========================================================================
    // Stack Operations
    // =========================================================================
    Pop = 0x57,
    Pop2 = 0x58,
    Dup = 0x59,

    // =========================================================================
    // Widening Conversions
    // =========================================================================
    I2l = 0x85,
    I2f = 0x86,
    I2d = 0x87,
    L2f = 0x89,
    L2d = 0x8a,
    F2d = 0x8d,

    // =========================================================================
    // Returns
    // =========================================================================
    Ireturn = 0xac,
    Lreturn = 0xad,
    Freturn = 0xae,
    Dreturn = 0xaf,
    Areturn = 0xb0,
    Return = 0xb1,

    // =========================================================================
    // Fields and Calls
    // =========================================================================
    /// Operand: u16 field ref index
    Getstatic = 0xb2,
    Putstatic = 0xb3,
    Getfield = 0xb4,
    Putfield = 0xb5,
    /// Operand: u16 method ref index
    Invokevirtual = 0xb6,
    Invokespecial = 0xb7,
    Invokestatic = 0xb8,
    /// Operands: u16 interface method ref index, u8 argument count, u8 zero
    Invokeinterface = 0xb9,

    /// Prefix widening the next load/store slot operand to u16.
    Wide = 0xc4,
}

impl OpCode {
    /// Convert from u8, returning None for values we never emit.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Size of the inline operands in bytes, not counting the opcode.
    ///
    /// Load and store sizes are for the narrow form; after [`OpCode::Wide`]
    /// their slot operand takes two bytes.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::Bipush
            | OpCode::Ldc
            | OpCode::Iload
            | OpCode::Lload
            | OpCode::Fload
            | OpCode::Dload
            | OpCode::Aload
            | OpCode::Istore
            | OpCode::Lstore
            | OpCode::Fstore
            | OpCode::Dstore
            | OpCode::Astore => 1,
            OpCode::Sipush
            | OpCode::LdcW
            | OpCode::Ldc2W
            | OpCode::Getstatic
            | OpCode::Putstatic
            | OpCode::Getfield
            | OpCode::Putfield
            | OpCode::Invokevirtual
            | OpCode::Invokespecial
            | OpCode::Invokestatic => 2,
            OpCode::Invokeinterface => 4,
            _ => 0,
        }
    }

    /// Mnemonic as printed by disassemblers.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::AconstNull => "aconst_null",
            OpCode::IconstM1 => "iconst_m1",
            OpCode::Iconst0 => "iconst_0",
            OpCode::Iconst1 => "iconst_1",
            OpCode::Iconst2 => "iconst_2",
            OpCode::Iconst3 => "iconst_3",
            OpCode::Iconst4 => "iconst_4",
            OpCode::Iconst5 => "iconst_5",
            OpCode::Lconst0 => "lconst_0",
            OpCode::Lconst1 => "lconst_1",
            OpCode::Fconst0 => "fconst_0",
            OpCode::Fconst1 => "fconst_1",
            OpCode::Fconst2 => "fconst_2",
            OpCode::Dconst0 => "dconst_0",
            OpCode::Dconst1 => "dconst_1",
            OpCode::Bipush => "bipush",
            OpCode::Sipush => "sipush",
            OpCode::Ldc => "ldc",
            OpCode::LdcW => "ldc_w",
            OpCode::Ldc2W => "ldc2_w",
            OpCode::Iload => "iload",
            OpCode::Lload => "lload",
            OpCode::Fload => "fload",
            OpCode::Dload => "dload",
            OpCode::Aload => "aload",
            OpCode::Iload0 => "iload_0",
            OpCode::Iload1 => "iload_1",
            OpCode::Iload2 => "iload_2",
            OpCode::Iload3 => "iload_3",
            OpCode::Lload0 => "lload_0",
            OpCode::Lload1 => "lload_1",
            OpCode::Lload2 => "lload_2",
            OpCode::Lload3 => "lload_3",
            OpCode::Fload0 => "fload_0",
            OpCode::Fload1 => "fload_1",
            OpCode::Fload2 => "fload_2",
            OpCode::Fload3 => "fload_3",
            OpCode::Dload0 => "dload_0",
            OpCode::Dload1 => "dload_1",
            OpCode::Dload2 => "dload_2",
            OpCode::Dload3 => "dload_3",
            OpCode::Aload0 => "aload_0",
            OpCode::Aload1 => "aload_1",
            OpCode::Aload2 => "aload_2",
            OpCode::Aload3 => "aload_3",
            OpCode::Istore => "istore",
            OpCode::Lstore => "lstore",
            OpCode::Fstore => "fstore",
            OpCode::Dstore => "dstore",
            OpCode::Astore => "astore",
            OpCode::Istore0 => "istore_0",
            OpCode::Istore1 => "istore_1",
            OpCode::Istore2 => "istore_2",
            OpCode::Istore3 => "istore_3",
            OpCode::Lstore0 => "lstore_0",
            OpCode::Lstore1 => "lstore_1",
            OpCode::Lstore2 => "lstore_2",
            OpCode::Lstore3 => "lstore_3",
            OpCode::Fstore0 => "fstore_0",
            OpCode::Fstore1 => "fstore_1",
            OpCode::Fstore2 => "fstore_2",
            OpCode::Fstore3 => "fstore_3",
            OpCode::Dstore0 => "dstore_0",
            OpCode::Dstore1 => "dstore_1",
            OpCode::Dstore2 => "dstore_2",
            OpCode::Dstore3 => "dstore_3",
            OpCode::Astore0 => "astore_0",
            OpCode::Astore1 => "astore_1",
            OpCode::Astore2 => "astore_2",
            OpCode::Astore3 => "astore_3",
            OpCode::Pop => "pop",
            OpCode::Pop2 => "pop2",
            OpCode::Dup => "dup",
            OpCode::I2l => "i2l",
            OpCode::I2f => "i2f",
            OpCode::I2d => "i2d",
            OpCode::L2f => "l2f",
            OpCode::L2d => "l2d",
            OpCode::F2d => "f2d",
            OpCode::Ireturn => "ireturn",
            OpCode::Lreturn => "lreturn",
            OpCode::Freturn => "freturn",
            OpCode::Dreturn => "dreturn",
            OpCode::Areturn => "areturn",
            OpCode::Return => "return",
            OpCode::Getstatic => "getstatic",
            OpCode::Putstatic => "putstatic",
            OpCode::Getfield => "getfield",
            OpCode::Putfield => "putfield",
            OpCode::Invokevirtual => "invokevirtual",
            OpCode::Invokespecial => "invokespecial",
            OpCode::Invokestatic => "invokestatic",
            OpCode::Invokeinterface => "invokeinterface",
            OpCode::Wide => "wide",
        }
    }

    /// Whether this is one of the return instructions.
    pub fn is_return(&self) -> bool {
        matches!(
            self,
            OpCode::Ireturn
                | OpCode::Lreturn
                | OpCode::Freturn
                | OpCode::Dreturn
                | OpCode::Areturn
                | OpCode::Return
        )
    }

    /// Offset a `_0` short form by `slot` (0..=3).
    ///
    /// Only meaningful for the `xload_0`/`xstore_0` family; the short forms
    /// of each family are contiguous.
    pub(crate) fn short_form(self, slot: u8) -> Option<OpCode> {
        if slot > 3 {
            return None;
        }
        OpCode::from_u8(u8::from(self) + slot)
    }
}
