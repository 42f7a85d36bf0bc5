//! Code buffer for compiled methods.
//!
//! A `CodeBuffer` holds the instruction bytes of one method body together
//! with a compact line-number table: one entry each time the source line
//! changes.

use super::OpCode;

/// Start of the instructions generated for one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line: u32,
}

/// Instruction bytes of a single method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    code: Vec<u8>,
    lines: Vec<LineNumberEntry>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark_line(&mut self, line: u32) {
        if line == 0 || self.lines.last().is_some_and(|e| e.line == line) {
            return;
        }
        let start_pc = self.offset();
        if let Some(last) = self.lines.last_mut()
            && last.start_pc == start_pc
        {
            // nothing was emitted for the previous line
            last.line = line;
            return;
        }
        self.lines.push(LineNumberEntry { start_pc, line });
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.mark_line(line);
        self.code.push(op.into());
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    /// Current code offset.
    pub fn offset(&self) -> u16 {
        u16::try_from(self.code.len()).unwrap_or(u16::MAX)
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn line_numbers(&self) -> &[LineNumberEntry] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Decode the instruction stream into `(offset, opcode)` pairs.
    ///
    /// A `wide` prefix is reported as its own instruction; the prefixed
    /// load or store follows with a two-byte slot operand.
    pub fn instructions(&self) -> Vec<(usize, OpCode)> {
        let mut ops = Vec::new();
        let mut offset = 0;
        let mut widened = false;

        while offset < self.code.len() {
            let Some(op) = self.read_op(offset) else {
                offset += 1;
                continue;
            };
            ops.push((offset, op));
            let operands = match op.operand_size() {
                1 if widened => 2,
                size => size,
            };
            widened = op == OpCode::Wide;
            offset += 1 + operands;
        }

        ops
    }

    /// Extract all opcodes from the buffer, skipping operands.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions().into_iter().map(|(_, op)| op).collect()
    }

    /// Check that this buffer contains exactly the given opcode sequence.
    ///
    /// Operand values are ignored.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Human-readable listing, one instruction per line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (offset, op) in self.instructions() {
            out.push_str(&format!("{:4}: {}", offset, op.name()));
            match op.operand_size() {
                1 => {
                    if let Some(b) = self.read_byte(offset + 1) {
                        out.push_str(&format!(" {}", b));
                    }
                }
                2 | 4 => {
                    if let Some(v) = self.read_u16(offset + 1) {
                        out.push_str(&format!(" #{}", v));
                    }
                }
                _ => {}
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_are_big_endian() {
        let mut code = CodeBuffer::new();
        code.write_op(OpCode::Sipush, 1);
        code.write_u16(0x1234);
        assert_eq!(code.code(), &[0x11, 0x12, 0x34]);
        assert_eq!(code.read_u16(1), Some(0x1234));
    }

    #[test]
    fn opcodes_skip_operands() {
        let mut code = CodeBuffer::new();
        code.write_op(OpCode::Aload0, 1);
        code.write_op(OpCode::Invokespecial, 1);
        code.write_u16(3);
        code.write_op(OpCode::Return, 1);
        code.assert_opcodes(&[OpCode::Aload0, OpCode::Invokespecial, OpCode::Return]);
    }

    #[test]
    fn wide_prefix_doubles_slot_operand() {
        let mut code = CodeBuffer::new();
        code.write_op(OpCode::Wide, 1);
        code.write_op(OpCode::Istore, 1);
        code.write_u16(300);
        code.write_op(OpCode::Return, 1);
        code.assert_opcodes(&[OpCode::Wide, OpCode::Istore, OpCode::Return]);
    }

    #[test]
    fn line_table_records_changes() {
        let mut code = CodeBuffer::new();
        code.write_op(OpCode::Iconst1, 3);
        code.write_op(OpCode::Istore1, 3);
        code.write_op(OpCode::Iconst2, 4);
        code.write_op(OpCode::Istore2, 4);
        code.write_op(OpCode::Return, 0);
        assert_eq!(
            code.line_numbers(),
            &[
                LineNumberEntry { start_pc: 0, line: 3 },
                LineNumberEntry { start_pc: 2, line: 4 },
            ]
        );
    }

    #[test]
    fn disassemble_lists_operands() {
        let mut code = CodeBuffer::new();
        code.write_op(OpCode::Bipush, 1);
        code.write_byte(10);
        code.write_op(OpCode::Ireturn, 1);
        assert_eq!(code.disassemble(), "   0: bipush 10\n   2: ireturn\n");
    }
}
